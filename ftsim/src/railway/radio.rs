//! Train-to-train messaging through the map's radio mast.

use super::disruptor::Disruptor;
use super::journey::{self, Journey};
use super::train::{Train, TrainId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RadioSignal {
    EmergencyStop,
    Proceed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relay {
    Delivered(TrainId),
    /// Lost to a simulated communication failure.
    Dropped,
    NoTrainBehind,
}

/// The mast does not own trains; it is handed the map's trains and
/// journeys to find the receiver of a message.
#[derive(Debug, Clone, Default)]
pub struct RadioMast {
    failure_ratio: u32,
    delivered: usize,
    dropped: usize,
}

impl RadioMast {
    pub fn new(failure_ratio: u32) -> RadioMast {
        RadioMast { failure_ratio: failure_ratio, delivered: 0, dropped: 0 }
    }

    pub fn set_failure_ratio(&mut self, failure_ratio: u32) {
        self.failure_ratio = failure_ratio;
    }

    pub fn failure_ratio(&self) -> u32 {
        self.failure_ratio
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn pass_message_to_train_behind(&mut self,
                                        train: TrainId,
                                        signal: RadioSignal,
                                        trains: &mut [Train],
                                        journeys: &[Journey],
                                        disruptor: &mut Disruptor)
                                        -> Relay {
        let behind = match journey::train_behind(trains, journeys, train) {
            Some(t) => t,
            None => return Relay::NoTrainBehind,
        };
        if self.failure_ratio > 0 && disruptor.should_disrupt(self.failure_ratio) {
            self.dropped += 1;
            return Relay::Dropped;
        }
        trains[behind].ping(signal);
        self.delivered += 1;
        Relay::Delivered(behind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::railway::train::Location;

    fn setup() -> (Vec<Train>, Vec<Journey>) {
        let mut trains = vec![Train::new(1), Train::new(1)];
        let journeys = vec![Journey { id: 1, train: 0, path: 0, forward: true },
                            Journey { id: 2, train: 1, path: 0, forward: true }];
        for (i, t) in trains.iter_mut().enumerate() {
            t.journey = Some(i);
            t.location = Some(Location { step: 0, offset: 0.0, travelled: 50.0 - 20.0 * i as f64 });
        }
        (trains, journeys)
    }

    #[test]
    fn relays_to_follower() {
        let (mut trains, journeys) = setup();
        let mut mast = RadioMast::new(0);
        let mut d = Disruptor::new(0);
        assert_eq!(mast.pass_message_to_train_behind(0, RadioSignal::EmergencyStop,
                                                     &mut trains, &journeys, &mut d),
                   Relay::Delivered(1));
        assert_eq!(trains[1].inbox(), &[RadioSignal::EmergencyStop]);
        assert_eq!(mast.pass_message_to_train_behind(1, RadioSignal::EmergencyStop,
                                                     &mut trains, &journeys, &mut d),
                   Relay::NoTrainBehind);
        assert!(trains[0].inbox().is_empty());
        assert_eq!(mast.delivered(), 1);
    }

    #[test]
    fn total_failure_drops_everything() {
        let (mut trains, journeys) = setup();
        let mut mast = RadioMast::new(100);
        let mut d = Disruptor::new(0);
        for _ in 0..10 {
            assert_eq!(mast.pass_message_to_train_behind(0, RadioSignal::Proceed,
                                                         &mut trains, &journeys, &mut d),
                       Relay::Dropped);
        }
        assert!(trains[1].inbox().is_empty());
        assert_eq!(mast.dropped(), 10);
    }
}
