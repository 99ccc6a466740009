/// Offline lip-sync rendering into frame sinks.
pub mod lipsync;
