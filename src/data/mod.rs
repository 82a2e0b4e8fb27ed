pub mod loader;
pub mod types;

pub use loader::{
    load_controls, load_disasters, load_speeches, save_disasters, save_speeches, SchemaError,
};
pub use types::{
    ControlRecord, Controls, DisasterEvent, DisasterGroup, SpeechRecord, TopicFlag,
};
