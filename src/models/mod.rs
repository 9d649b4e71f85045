pub mod airport;
pub mod controller;
pub mod controller_summary;
pub mod flight_state;
pub mod flight_summary;
pub mod frequency_match;
pub mod pilot;
pub mod transceiver;

pub use airport::Airport;
pub use controller::{ControllerObs, ControllerRecord, ControllerRow, ControllerStatus};
pub use controller_summary::{AircraftInteraction, ControllerSummary, NewControllerSummaryRow};
pub use flight_state::{CompletionMethod, FlightKey, FlightState, FlightStateRow, FlightStatus};
pub use flight_summary::{ControllerInteraction, FlightSummary, NewFlightSummaryRow};
pub use frequency_match::{FrequencyMatch, FrequencyMatchRow, NewFrequencyMatchRow};
pub use pilot::{FlightPositionRow, NewFlightPositionRow, NewPilotRow, PilotObs, PilotRecord};
pub use transceiver::{EntityType, NewTransceiverRow, TransceiverObs, TransceiverRow};
