//! Trackside equipment.

pub type PlaceableId = usize;

#[derive(Clone, Debug, PartialEq)]
pub enum PlaceableKind {
    /// Fixed beacon carrying an advisory speed (m/s).
    PassiveBalise { advisory_speed: f64 },
    ActiveBalise { broken: bool },
    Obstacle,
}

#[derive(Clone, Debug)]
pub struct Placeable {
    pub id: i64,
    pub kind: PlaceableKind,
    /// Distance from the topological root of the track holding this
    /// placeable. Only known after world assembly.
    pub position: Option<f64>,
}

impl Placeable {
    pub fn passive_balise(id: i64, advisory_speed: f64) -> Placeable {
        Placeable {
            id: id,
            kind: PlaceableKind::PassiveBalise { advisory_speed: advisory_speed },
            position: None,
        }
    }

    pub fn active_balise(id: i64) -> Placeable {
        Placeable {
            id: id,
            kind: PlaceableKind::ActiveBalise { broken: false },
            position: None,
        }
    }

    pub fn obstacle(id: i64) -> Placeable {
        Placeable {
            id: id,
            kind: PlaceableKind::Obstacle,
            position: None,
        }
    }

    pub fn is_balise(&self) -> bool {
        match self.kind {
            PlaceableKind::PassiveBalise { .. } | PlaceableKind::ActiveBalise { .. } => true,
            PlaceableKind::Obstacle => false,
        }
    }

    pub fn is_active_balise(&self) -> bool {
        match self.kind {
            PlaceableKind::ActiveBalise { .. } => true,
            _ => false,
        }
    }

    pub fn is_broken(&self) -> bool {
        match self.kind {
            PlaceableKind::ActiveBalise { broken } => broken,
            _ => false,
        }
    }

    /// Only active balises can fail; the flag is ignored for other kinds.
    pub fn set_broken(&mut self, is_broken: bool) {
        if let PlaceableKind::ActiveBalise { ref mut broken } = self.kind {
            *broken = is_broken;
        }
    }
}
