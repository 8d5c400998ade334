pub mod buffer;
pub mod cancel;
pub mod config;
pub mod container;
pub mod dump;
pub mod error;
pub mod infer;
pub mod locator;
pub mod schema;

#[doc(hidden)]
pub mod synthetic;

pub use buffer::{Buffer, ByteWidth, RawValue, Signedness};
pub use cancel::CancelToken;
pub use config::{Config, InferenceOptions};
pub use container::{ContainerFormat, FrameDescriptor, RawFile, SaveHeader, load_buffer};
pub use error::{ContainerError, Error, Result};
pub use infer::{
    CategoryExpectations, Confidence, Encoding, ProbeInput, ProbeReport, SchemaEntry,
    SchemaInference, Transition,
};
pub use locator::{Anchor, AnchorSelection, find_all_length_prefixed, find_anchors};
pub use schema::{Conflict, ConflictKind, FailedProbe, Schema};
