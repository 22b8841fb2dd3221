//! The set of views a vehicle exposes to the director.

use std::fmt;

/// Names one of the four views in a [`CameraSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewSlot {
    /// Egocentric view mounted on the vehicle (carries the gimbal).
    Fpv,
    /// Forward-facing view mounted on the vehicle.
    Front,
    /// Rear view mounted on the vehicle.
    Backup,
    /// The shared free-moving view used by chase, follow and manual modes.
    External,
}

impl ViewSlot {
    /// All slots, in display-toggle order.
    pub const ALL: [ViewSlot; 4] = [
        ViewSlot::Fpv,
        ViewSlot::Backup,
        ViewSlot::External,
        ViewSlot::Front,
    ];
}

impl fmt::Display for ViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewSlot::Fpv => "fpv camera",
            ViewSlot::Front => "front camera",
            ViewSlot::Backup => "backup camera",
            ViewSlot::External => "external camera",
        };
        f.write_str(name)
    }
}

/// Handles to the views usable in the various modes.
///
/// Every slot is optional. The external view is required by all modes
/// except Backup and Front, which use their own views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraSet<N> {
    /// Egocentric view.
    pub fpv: Option<N>,
    /// Front view.
    pub front: Option<N>,
    /// Rear view.
    pub backup: Option<N>,
    /// Shared external view.
    pub external: Option<N>,
}

impl<N> Default for CameraSet<N> {
    fn default() -> Self {
        Self {
            fpv: None,
            front: None,
            backup: None,
            external: None,
        }
    }
}

impl<N: Copy> CameraSet<N> {
    /// Look up the view in a slot.
    pub fn get(&self, slot: ViewSlot) -> Option<N> {
        match slot {
            ViewSlot::Fpv => self.fpv,
            ViewSlot::Front => self.front,
            ViewSlot::Backup => self.backup,
            ViewSlot::External => self.external,
        }
    }

    /// Iterate over the present views with their slots.
    pub fn present(&self) -> impl Iterator<Item = (ViewSlot, N)> + '_ {
        ViewSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|view| (slot, view)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_skips_missing_views() {
        let cameras = CameraSet {
            fpv: Some(1),
            front: None,
            backup: None,
            external: Some(4),
        };
        let present: Vec<_> = cameras.present().collect();
        assert_eq!(present, vec![(ViewSlot::Fpv, 1), (ViewSlot::External, 4)]);
    }
}
