// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive client.
//
// Module responsibilities:
// - `transport`: outbound HTTP, reporting "no response" as `None`.
// - `session`: base URL and login token for one run, token persistence.
// - `api`: one handler per command, returning an `Outcome` or a
//   `CommandError`.
// - `models`: wire types and user-data body unwrapping.
// - `chart`: budget vs. spending bar chart.
// - `config`: the process-wide INI config.
// - `ui`: the numbered menu loop.
pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;
pub mod ui;
