//! Headless host for the ecosim economy: script parsing, sessions and
//! text reports used by the `ecosim` binary.

pub mod command_parser;
pub mod report;
pub mod session;

pub use command_parser::{parse_line, ParseError, ScriptLine};
pub use session::{LineError, LineOutcome, Session};
