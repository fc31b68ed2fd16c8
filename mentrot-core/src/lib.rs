pub mod layout;
pub mod phase;
pub mod scene;
pub mod source;
pub mod stimulus;
pub mod trial;

pub use layout::{Bounds, Side, TrialLayout};
pub use phase::SessionPhase;
pub use scene::{Scene, TrialScene};
pub use source::{StimulusSizes, StimulusSource};
pub use stimulus::{TrialSpec, all_names, required_names, test_specs, training_specs};
pub use trial::{Response, TrialResult, TrialState};
