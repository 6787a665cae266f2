use failure::Fail;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

use super::constants::*;
use super::placeable::{Placeable, PlaceableId};
use super::signalling::{ControllerId, SignalUnit};

pub type TrackId = usize;

#[derive(Debug, Fail, PartialEq)]
pub enum PlacementError {
    #[fail(display = "the section index {} does not exist, number of sections: {}", index, sections)]
    SectionOutOfRange { index: usize, sections: usize },
    #[fail(display = "placeable {} is already placed on section {}", placeable, index)]
    AlreadyPlaced { placeable: PlaceableId, index: usize },
}

#[derive(Clone, Debug)]
pub struct Section {
    pub length: f64,
    pub placeables: SmallVec<[PlaceableId; 1]>,
}

impl Default for Section {
    fn default() -> Section {
        Section {
            length: DEFAULT_SECTION_LENGTH,
            placeables: SmallVec::new(),
        }
    }
}

/// Multipliers applied to a train's normal acceleration and deceleration
/// while it runs on the track.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineCondition {
    pub acceleration: f64,
    pub deceleration: f64,
}

impl Default for LineCondition {
    fn default() -> LineCondition {
        LineCondition {
            acceleration: ACCELERATION_COEFFICIENT,
            deceleration: DECELERATION_COEFFICIENT,
        }
    }
}

#[derive(Debug)]
pub struct Track {
    pub id: i64,
    pub line_condition: LineCondition,
    /// Counterpart track of a dual line.
    pub pair: Option<TrackId>,
    sections: Vec<Section>,
    length: f64,
    placeables: BTreeMap<usize, PlaceableId>,
    placeable_index: HashMap<PlaceableId, usize>,
    block_signals: SmallVec<[(usize, SignalUnit); 2]>,
    signal_controller: Option<ControllerId>,
}

impl Track {
    pub fn new(num_sections: usize) -> Track {
        Track::from_sections((0..num_sections).map(|_| Section::default()).collect())
    }

    pub fn from_sections(sections: Vec<Section>) -> Track {
        let length = sections.iter().map(|s| s.length).sum();
        Track {
            id: 0,
            line_condition: LineCondition::default(),
            pair: None,
            sections: sections,
            length: length,
            placeables: BTreeMap::new(),
            placeable_index: HashMap::new(),
            block_signals: SmallVec::new(),
            signal_controller: None,
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Distance from the start of the track to the start of a section.
    pub fn section_offset(&self, index: usize) -> f64 {
        self.sections.iter().take(index).map(|s| s.length).sum()
    }

    fn check_index(&self, index: usize) -> Result<(), PlacementError> {
        if index >= self.sections.len() {
            return Err(PlacementError::SectionOutOfRange {
                index: index,
                sections: self.sections.len(),
            });
        }
        Ok(())
    }

    /// Places a placeable on a section. A placeable already occupying the
    /// section is evicted and returned.
    pub fn place_placeable_on_section_index(&mut self,
                                            placeable: PlaceableId,
                                            index: usize)
                                            -> Result<Option<PlaceableId>, PlacementError> {
        self.check_index(index)?;
        match self.placeable_index.get(&placeable) {
            Some(&i) if i == index => return Ok(None),
            Some(&i) => return Err(PlacementError::AlreadyPlaced { placeable: placeable, index: i }),
            None => {}
        }

        let evicted = self.placeables.insert(index, placeable);
        if let Some(old) = evicted {
            self.placeable_index.remove(&old);
            self.sections[index].placeables.retain(|p| *p != old);
        }
        self.placeable_index.insert(placeable, index);
        self.sections[index].placeables.push(placeable);
        Ok(evicted)
    }

    pub fn placeable_position(&self, placeable: PlaceableId) -> Option<usize> {
        self.placeable_index.get(&placeable).cloned()
    }

    pub fn has_placeable(&self, placeable: PlaceableId) -> bool {
        self.placeable_index.contains_key(&placeable)
    }

    pub fn placeable_at(&self, index: usize) -> Option<PlaceableId> {
        self.placeables.get(&index).cloned()
    }

    /// (section index, placeable) pairs in section order.
    pub fn placeables<'a>(&'a self) -> impl Iterator<Item = (usize, PlaceableId)> + 'a {
        self.placeables.iter().map(|(i, p)| (*i, *p))
    }

    pub fn balises(&self, arena: &[Placeable]) -> Vec<PlaceableId> {
        self.placeables.values().cloned().filter(|p| arena[*p].is_balise()).collect()
    }

    pub fn active_balises(&self, arena: &[Placeable]) -> Vec<PlaceableId> {
        self.placeables.values().cloned().filter(|p| arena[*p].is_active_balise()).collect()
    }

    pub fn add_block_signal(&mut self, signal: SignalUnit, index: usize)
        -> Result<(), PlacementError> {
        self.check_index(index)?;
        let pos = self.block_signals.iter().position(|(i, _)| *i > index)
            .unwrap_or(self.block_signals.len());
        self.block_signals.insert(pos, (index, signal));
        Ok(())
    }

    /// Block signals ordered by section index.
    pub fn block_signals(&self) -> &[(usize, SignalUnit)] {
        &self.block_signals
    }

    pub fn signal_controller(&self) -> Option<ControllerId> {
        self.signal_controller
    }

    /// Attaches a controller guarding this track. Fails with the existing
    /// controller if one is already attached.
    pub fn add_signal_controller(&mut self, controller: ControllerId) -> Result<(), ControllerId> {
        match self.signal_controller {
            Some(existing) => Err(existing),
            None => {
                self.signal_controller = Some(controller);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::railway::placeable::Placeable;
    use crate::railway::signalling::{SignalKind, SignalUnit};

    #[test]
    fn length_is_sum_of_sections() {
        for n in &[0usize, 1, 15, 25] {
            let t = Track::new(*n);
            let sum: f64 = t.sections().iter().map(|s| s.length).sum();
            assert_eq!(t.length(), sum);
            assert_eq!(t.length(), *n as f64 * DEFAULT_SECTION_LENGTH);
        }

        let mut sections = vec![Section::default(), Section::default()];
        sections[1].length = 2.5;
        let t = Track::from_sections(sections);
        assert_eq!(t.length(), 3.5);
        assert_eq!(t.section_offset(1), 1.0);
    }

    #[test]
    fn placement_bounds() {
        let mut t = Track::new(10);
        assert_eq!(t.place_placeable_on_section_index(0, 10),
                   Err(PlacementError::SectionOutOfRange { index: 10, sections: 10 }));
        assert!(!t.has_placeable(0));

        assert_eq!(t.place_placeable_on_section_index(0, 9), Ok(None));
        assert_eq!(t.placeable_position(0), Some(9));
        assert!(t.has_placeable(0));
        assert_eq!(t.sections()[9].placeables.as_slice(), &[0]);
    }

    #[test]
    fn placement_is_bijective() {
        let mut t = Track::new(10);
        t.place_placeable_on_section_index(0, 3).unwrap();
        assert_eq!(t.place_placeable_on_section_index(0, 3), Ok(None));
        assert_eq!(t.place_placeable_on_section_index(0, 4),
                   Err(PlacementError::AlreadyPlaced { placeable: 0, index: 3 }));

        // Another placeable on the same section replaces the first one.
        assert_eq!(t.place_placeable_on_section_index(1, 3), Ok(Some(0)));
        assert!(!t.has_placeable(0));
        assert_eq!(t.placeable_at(3), Some(1));
        assert_eq!(t.sections()[3].placeables.as_slice(), &[1]);
    }

    #[test]
    fn balise_filter() {
        let arena = vec![Placeable::passive_balise(1, 20.0),
                         Placeable::obstacle(2),
                         Placeable::active_balise(3)];
        let mut t = Track::new(10);
        for (i, p) in [0usize, 1, 2].iter().enumerate() {
            t.place_placeable_on_section_index(*p, i * 2).unwrap();
        }
        assert_eq!(t.balises(&arena), vec![0, 2]);
        assert_eq!(t.active_balises(&arena), vec![2]);
    }

    #[test]
    fn block_signals_ordered() {
        let mut t = Track::new(25);
        t.add_block_signal(SignalUnit { kind: SignalKind::Distant, controller: 1 }, 4).unwrap();
        t.add_block_signal(SignalUnit { kind: SignalKind::Main, controller: 0 }, 0).unwrap();
        let idx: Vec<usize> = t.block_signals().iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![0, 4]);
        assert!(t.add_block_signal(SignalUnit { kind: SignalKind::Main, controller: 2 }, 25).is_err());

        assert_eq!(t.add_signal_controller(0), Ok(()));
        assert_eq!(t.add_signal_controller(3), Err(0));
        assert_eq!(t.signal_controller(), Some(0));
    }
}
