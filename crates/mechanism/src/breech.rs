/// The weapon side of a slide: what happens when the slide closes (feed) or
/// locks back (eject).
pub trait Breech {
    /// Strip a round from the magazine into the chamber. Returns whether a
    /// round was chambered.
    fn try_feed_from_magazine(&mut self) -> bool;

    /// Throw out whatever is in the chamber. Returns whether anything was
    /// ejected.
    fn try_eject_from_chamber(&mut self) -> bool;
}

/// Magazine plus a single chamber.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chamber {
    pub magazine: u32,
    pub chambered: bool,
    /// Rounds thrown out so far.
    pub ejected: u32,
}

impl Chamber {
    pub fn with_magazine(rounds: u32) -> Self {
        Self {
            magazine: rounds,
            ..Self::default()
        }
    }
}

impl Breech for Chamber {
    fn try_feed_from_magazine(&mut self) -> bool {
        if self.chambered || self.magazine == 0 {
            return false;
        }
        self.magazine -= 1;
        self.chambered = true;
        true
    }

    fn try_eject_from_chamber(&mut self) -> bool {
        if !self.chambered {
            return false;
        }
        self.chambered = false;
        self.ejected += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_through_magazine() {
        let mut c = Chamber::with_magazine(2);
        assert!(!c.try_eject_from_chamber());
        assert!(c.try_feed_from_magazine());
        assert!(!c.try_feed_from_magazine(), "chamber already full");
        assert!(c.try_eject_from_chamber());
        assert!(c.try_feed_from_magazine());
        assert!(c.try_eject_from_chamber());
        assert!(!c.try_feed_from_magazine(), "magazine empty");
        assert_eq!(c.ejected, 2);
    }
}
