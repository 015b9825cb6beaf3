pub mod local_network;

pub use local_network::{LocalNetwork, SERVER_PEER};
pub use recording_context::RecordingContext;
pub use test_nodes::{
    CountingNode, FailingNode, LoggingNode, NodeLog, RoundInfo, RoundNode, ScoreNode,
};
