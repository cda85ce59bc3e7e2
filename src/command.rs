//! Interactive command handling.
//!
//! A [`Session`] owns one allocator and turns command lines into text
//! replies. Engine errors become part of the reply; they never end the
//! session.
//!
//! # Example
//!
//! ```rust
//! use vmem_sim::command::Session;
//! use vmem_sim::SimConfig;
//!
//! let mut session = Session::new(SimConfig::default()).unwrap();
//!
//! let reply = session.handle_line("alloc 1 150 first");
//! assert_eq!(reply.output, "Allocated 200 units (in 2 pages) to PID 1 at address 0\n");
//!
//! let reply = session.handle_line("free 7");
//! assert_eq!(reply.output, "Error: PID 7 not found\n");
//! assert!(!reply.exit);
//! ```

use crate::allocator::MemoryAllocator;
use crate::block::Pid;
use crate::config::{MapConfig, SimConfig};
use crate::render::{render_map, render_stats, render_table};
use crate::strategy::FitStrategy;
use crate::{Error, Result};
use std::fmt::Write;

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  alloc <pid> <size> [first|best|next] - allocate memory
  free <pid>                           - free memory
  show                                 - show memory table
  map                                  - ASCII memory map
  stats                                - usage statistics
  help                                 - show this help
  exit                                 - quit
";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Allocate memory. The strategy stays a raw name so that unknown names
    /// are reported by the engine.
    Alloc {
        /// Owner.
        pid: Pid,
        /// Requested units.
        size: usize,
        /// Strategy name, session default when absent.
        strategy: Option<String>,
    },
    /// Free all memory of an owner.
    Free {
        /// Owner.
        pid: Pid,
    },
    /// Print the block table.
    Show,
    /// Print the occupancy map.
    Map,
    /// Print usage statistics.
    Stats,
    /// Print the command list.
    Help,
    /// End the session.
    Exit,
}

impl Command {
    /// Parse a command line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb {
            "alloc" => {
                let pid = parse_pid(words.next())?;
                let size = words
                    .next()
                    .ok_or_else(|| Error::command("usage: alloc <pid> <size> [strategy]"))?;
                let size = size
                    .parse()
                    .map_err(|_| Error::command(format!("invalid size '{size}'")))?;
                let strategy = words.next().map(str::to_string);
                Self::Alloc {
                    pid,
                    size,
                    strategy,
                }
            }
            "free" => Self::Free {
                pid: parse_pid(words.next())?,
            },
            "show" => Self::Show,
            "map" => Self::Map,
            "stats" => Self::Stats,
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            other => return Err(Error::command(format!("unknown command '{other}'"))),
        };

        if let Some(extra) = words.next() {
            return Err(Error::command(format!("unexpected argument '{extra}'")));
        }

        Ok(Some(command))
    }
}

fn parse_pid(word: Option<&str>) -> Result<Pid> {
    let word = word.ok_or_else(|| Error::command("missing PID"))?;
    word.parse()
        .map(Pid)
        .map_err(|_| Error::command(format!("invalid PID '{word}'")))
}

/// Text produced for one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Text to print.
    pub output: String,
    /// Whether the session should end.
    pub exit: bool,
}

impl Reply {
    fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit: false,
        }
    }
}

/// An allocator driven by text commands.
#[derive(Debug)]
pub struct Session {
    allocator: MemoryAllocator,
    map: MapConfig,
    default_strategy: FitStrategy,
}

impl Session {
    /// Create a session from configuration.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            allocator: MemoryAllocator::new(config.allocator)?,
            map: config.map,
            default_strategy: config.default_strategy,
        })
    }

    /// The session's allocator.
    pub const fn allocator(&self) -> &MemoryAllocator {
        &self.allocator
    }

    /// Parse and run one line.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Reply::default(),
            Err(e) => Reply::text(format!("Error: {e}\n")),
        }
    }

    /// Run a parsed command.
    pub fn execute(&mut self, command: Command) -> Reply {
        match command {
            Command::Alloc {
                pid,
                size,
                strategy,
            } => {
                let strategy = strategy.unwrap_or_else(|| self.default_strategy.to_string());
                match self.allocator.allocate_named(pid, size, &strategy) {
                    Ok(allocation) => {
                        let mut out = swap_out_lines(&allocation.evicted);
                        let _ = writeln!(
                            out,
                            "Allocated {} units (in {} pages) to PID {} at address {}",
                            allocation.size, allocation.pages, allocation.owner, allocation.address
                        );
                        Reply::text(out)
                    }
                    Err(e) => {
                        let mut out = swap_out_lines(e.evicted());
                        let _ = writeln!(out, "Error: {e}");
                        Reply::text(out)
                    }
                }
            }
            Command::Free { pid } => {
                let held: Vec<usize> = self
                    .allocator
                    .list_blocks()
                    .iter()
                    .filter(|b| b.owner == Some(pid))
                    .map(|b| b.range.start)
                    .collect();

                match self.allocator.deallocate(pid) {
                    Ok(_) => {
                        let mut out = String::new();
                        for address in held {
                            let _ = writeln!(out, "Freed memory of PID {pid} at address {address}");
                        }
                        Reply::text(out)
                    }
                    Err(e) => Reply::text(format!("Error: {e}\n")),
                }
            }
            Command::Show => Reply::text(render_table(&self.allocator.list_blocks())),
            Command::Map => Reply::text(render_map(
                &self.allocator.list_blocks(),
                self.allocator.total_size(),
                &self.map,
            )),
            Command::Stats => Reply::text(render_stats(
                &self.allocator.stats(),
                &self.allocator.memory_stats(),
            )),
            Command::Help => Reply::text(HELP),
            Command::Exit => Reply {
                output: String::new(),
                exit: true,
            },
        }
    }
}

fn swap_out_lines(victims: &[Pid]) -> String {
    let mut out = String::new();
    for victim in victims {
        let _ = writeln!(out, "Swapped out PID {victim}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocatorConfig;

    fn session() -> Session {
        Session::new(SimConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_alloc() {
        assert_eq!(
            Command::parse("alloc 3 250 best").unwrap(),
            Some(Command::Alloc {
                pid: Pid(3),
                size: 250,
                strategy: Some("best".into()),
            })
        );
        assert_eq!(
            Command::parse("  alloc 3 250  ").unwrap(),
            Some(Command::Alloc {
                pid: Pid(3),
                size: 250,
                strategy: None,
            })
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("free 4").unwrap(), Some(Command::Free { pid: Pid(4) }));
        assert_eq!(Command::parse("show").unwrap(), Some(Command::Show));
        assert_eq!(Command::parse("map").unwrap(), Some(Command::Map));
        assert_eq!(Command::parse("stats").unwrap(), Some(Command::Stats));
        assert_eq!(Command::parse("help").unwrap(), Some(Command::Help));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Exit));
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Exit));
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        for line in [
            "launch",
            "alloc",
            "alloc x 10",
            "alloc 1",
            "alloc 1 -5",
            "alloc 1 10 first extra",
            "free",
            "free -1",
            "show all",
        ] {
            let err = Command::parse(line).unwrap_err();
            assert_eq!(err.code(), "COMMAND", "line: {line}");
        }
    }

    #[test]
    fn test_session_alloc_and_show() {
        let mut session = session();
        session.handle_line("alloc 1 150 first");

        let reply = session.handle_line("show");
        assert_eq!(
            reply.output,
            "--- Memory Blocks ---\n[0 - 199] : Allocated (PID 1)\n[200 - 999] : Free\n"
        );
    }

    #[test]
    fn test_session_default_strategy() {
        let config = SimConfig {
            default_strategy: FitStrategy::Best,
            ..Default::default()
        };
        let mut session = Session::new(config).unwrap();
        session.handle_line("alloc 1 300");
        session.handle_line("alloc 2 100");
        session.handle_line("alloc 3 100");
        session.handle_line("free 1");
        // Free: 0..300 and 500..1000. Best fit picks 0..300.
        let reply = session.handle_line("alloc 4 200");
        assert!(reply.output.ends_with("at address 0\n"));
    }

    #[test]
    fn test_session_reports_swap_out() {
        let mut session = session();
        session.handle_line("alloc 1 500");
        session.handle_line("alloc 2 500");

        let reply = session.handle_line("alloc 3 400 next");
        assert_eq!(
            reply.output,
            "Swapped out PID 1\nAllocated 400 units (in 4 pages) to PID 3 at address 0\n"
        );
    }

    #[test]
    fn test_session_reports_errors() {
        let mut session = session();

        assert_eq!(
            session.handle_line("alloc 1 10 worst").output,
            "Error: unknown strategy: worst\n"
        );
        assert_eq!(
            session.handle_line("alloc 1 0").output,
            "Error: invalid request: allocation size must be positive\n"
        );
        assert!(session
            .handle_line("alloc 1 5000")
            .output
            .starts_with("Error: out of memory"));
        assert_eq!(
            session.handle_line("bogus").output,
            "Error: command error: unknown command 'bogus'\n"
        );
        assert_eq!(session.allocator().list_blocks().len(), 1);
    }

    #[test]
    fn test_session_free() {
        let mut session = session();
        session.handle_line("alloc 5 100");
        session.handle_line("alloc 6 100");
        session.handle_line("alloc 5 100");
        assert_eq!(
            session.handle_line("free 5").output,
            "Freed memory of PID 5 at address 0\nFreed memory of PID 5 at address 200\n"
        );
        assert_eq!(session.handle_line("free 5").output, "Error: PID 5 not found\n");
    }

    #[test]
    fn test_session_reports_swap_out_before_exhaustion() {
        let mut session = session();
        session.handle_line("alloc 1 500");
        session.handle_line("alloc 2 500");

        let reply = session.handle_line("alloc 3 1100");
        assert_eq!(
            reply.output,
            "Swapped out PID 1\nSwapped out PID 2\n\
             Error: out of memory: no free block of 1100 units for PID 3\n"
        );
        assert_eq!(
            session.handle_line("show").output,
            "--- Memory Blocks ---\n[0 - 999] : Free\n"
        );
    }

    #[test]
    fn test_session_map_and_stats() {
        let config = SimConfig {
            map: MapConfig::with_buckets(10),
            ..Default::default()
        };
        let mut session = Session::new(config).unwrap();
        session.handle_line("alloc 1 300");

        let map = session.handle_line("map").output;
        assert!(map.contains("\n###.......\n"));

        let stats = session.handle_line("stats").output;
        assert!(stats.contains("Used: 300 / 1000 units (30.0%)"));
    }

    #[test]
    fn test_session_help_and_exit() {
        let mut session = session();
        assert_eq!(session.handle_line("help").output, HELP);
        assert!(session.handle_line("exit").exit);
        assert_eq!(session.handle_line("").output, "");
    }

    #[test]
    fn test_session_rejects_invalid_config() {
        let config = SimConfig {
            allocator: AllocatorConfig::with_size(0),
            ..Default::default()
        };
        assert!(Session::new(config).is_err());
    }
}
