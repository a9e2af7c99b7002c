//! Interactive streaming session
//!
//! Reads operator lines from stdin. Discrete session controls (`start`,
//! `stop`, `baseline`, `stats`, `schema`) drive the scheduler directly;
//! everything else goes through the NL parser. Body-scope turns are both
//! routed as protocol commands and enqueued as local streaming mode
//! changes, so the rig hears the command and sees the motion.

use std::io::{self, BufRead, Write};

use tracing::info;

use crate::command_parser::NlpParser;
use crate::intents::{Direction, Intent, Scope};
use crate::osc_transport::Transport;
use crate::router::IntentRouter;
use crate::scheduler::{FrameScheduler, StreamCommand};

/// One interactive session: parser + router + a running scheduler
pub struct StreamSession<T: Transport> {
    parser: NlpParser,
    router: IntentRouter<T>,
    scheduler: FrameScheduler,
}

impl<T: Transport> StreamSession<T> {
    pub fn new(router: IntentRouter<T>, scheduler: FrameScheduler) -> Self {
        Self {
            parser: NlpParser::new(),
            router,
            scheduler,
        }
    }

    /// Handle one input line. Returns `(keep_going, reply)`.
    pub fn handle_line(&mut self, line: &str) -> (bool, String) {
        let folded = line.trim().to_lowercase();

        // Discrete session controls first - these mirror the old GUI buttons
        match folded.as_str() {
            "start" => return (true, self.queue(StreamCommand::Start, "streaming: heartbeat")),
            "stop" => return (true, self.queue(StreamCommand::Stop, "streaming stopped")),
            "baseline" | "basic position" => {
                return (
                    true,
                    self.queue(StreamCommand::Baseline, "returning to baseline"),
                )
            }
            "stats" => return (true, self.scheduler.stats().to_string()),
            "schema" => return (true, self.router.get_osc_schema()),
            _ => {}
        }

        let intent = self.parser.parse(line);
        match &intent {
            Intent::Quit => {
                let (_, message) = self.router.route(&intent);
                (false, message)
            }
            Intent::Help => {
                let (_, message) = self.router.route(&intent);
                let examples = self.parser.get_help_examples().join("\n  ");
                (
                    true,
                    format!(
                        "{}\nSession controls: start | stop | baseline | stats | schema\nExamples:\n  {}",
                        message, examples
                    ),
                )
            }
            Intent::Turn {
                scope: Scope::Body,
                direction,
                ..
            } => {
                let command = match direction {
                    Direction::Left => StreamCommand::TurnLeft,
                    Direction::Right => StreamCommand::TurnRight,
                };
                let queued = self.queue(command, "streaming turn");
                let (_, routed) = self.router.route(&intent);
                (true, format!("{} | {}", routed, queued))
            }
            _ => {
                let (_, message) = self.router.route(&intent);
                (true, message)
            }
        }
    }

    fn queue(&self, command: StreamCommand, reply: &str) -> String {
        match self.scheduler.send_command(command) {
            Ok(()) => reply.to_string(),
            Err(e) => format!("cannot queue command: {}", e),
        }
    }

    /// Run the stdin loop until quit or EOF, then stop the scheduler
    pub fn run(mut self) -> io::Result<()> {
        println!("Marionette streaming session");
        println!("Type commands ('help' for examples, 'quit' to leave)\n");

        let stdin = io::stdin();
        print!("rig> ");
        io::stdout().flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            let (keep_going, reply) = self.handle_line(&line);
            println!("{}", reply);
            if !keep_going {
                break;
            }
            print!("rig> ");
            io::stdout().flush()?;
        }

        info!("session closed");
        self.scheduler.shutdown();
        Ok(())
    }

    /// Tear down without consuming stdin (used by tests and one-shot paths)
    pub fn shutdown(self) {
        self.scheduler.shutdown();
    }
}
