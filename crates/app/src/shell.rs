//! Line-oriented terminal loop.
//!
//! The shell shows one view at a time. The list view is activated when
//! entered and deactivated when left, so polling and the hub subscription
//! only run while the list is on screen. Input is read while the first
//! fetch is still in flight.

use std::io::Write;
use std::sync::Arc;

use reportdesk_client::client::HubClient;
use reportdesk_client::{FeedSettings, ReportService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::error::AppResult;
use crate::router::{self, View};
use crate::views::{CreateReportForm, ReportListView, SubmitOutcome};

const HELP: &str = "\
Commands:
  list                  show the job list
  new                   open the new-report form
  go <path>             navigate to `reports` or `create-report`
  type <name>           (form) set the report type
  start <YYYY-MM-DD>    (form) set the start date
  end <YYYY-MM-DD>      (form) set the end date
  submit                (form) submit the request
  cancel                (form) back to the list
  help                  show this help
  quit                  exit
";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    New,
    Go(String),
    SetType(String),
    SetStart(String),
    SetEnd(String),
    Submit,
    Cancel,
    Help,
    Quit,
}

/// Parse one input line. `Err` carries a message for the user.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let needs_arg = |make: fn(String) -> Command| {
        if rest.is_empty() {
            Err(format!("`{word}` needs a value"))
        } else {
            Ok(make(rest.to_string()))
        }
    };

    match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(Command::List),
        "new" => Ok(Command::New),
        "go" => needs_arg(Command::Go),
        "type" => needs_arg(Command::SetType),
        "start" => needs_arg(Command::SetStart),
        "end" => needs_arg(Command::SetEnd),
        "submit" => Ok(Command::Submit),
        "cancel" => Ok(Command::Cancel),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "" => Err(String::new()),
        other => Err(format!("Unknown command `{other}`; type `help`")),
    }
}

pub struct Shell {
    service: Arc<dyn ReportService>,
    hub: Option<HubClient>,
    settings: FeedSettings,
}

impl Shell {
    pub fn new(
        service: Arc<dyn ReportService>,
        hub: Option<HubClient>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            service,
            hub,
            settings,
        }
    }

    /// Run until `quit` or end of input, starting at `start`.
    pub async fn run<R, W>(&self, input: R, mut output: W, start: View) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut view = start;

        loop {
            let next = match view {
                View::ReportList => self.list_view(&mut lines, &mut output).await?,
                View::CreateReport => self.create_view(&mut lines, &mut output).await?,
            };
            match next {
                Some(next) => view = next,
                None => return Ok(()),
            }
        }
    }

    async fn list_view<R, W>(&self, lines: &mut Lines<R>, output: &mut W) -> AppResult<Option<View>>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(output, "Loading reports...")?;
        let mut list = ReportListView::activate(
            Arc::clone(&self.service),
            self.hub.clone(),
            self.settings.clone(),
        );
        write!(output, "{}", list.render())?;

        let mut live = true;
        let next = loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break None,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to read input");
                            break None;
                        }
                    };
                    match parse_command(&line) {
                        Ok(Command::Quit) => break None,
                        Ok(Command::New) => break Some(View::CreateReport),
                        Ok(Command::Go(path)) => match router::resolve(&path) {
                            Ok(View::ReportList) => write!(output, "{}", list.render())?,
                            Ok(other) => break Some(other),
                            Err(e) => writeln!(output, "{e}")?,
                        },
                        Ok(Command::List) => write!(output, "{}", list.render())?,
                        Ok(Command::Help) => write!(output, "{HELP}")?,
                        Ok(_) => {
                            writeln!(output, "Not available here; type `new` to open the form.")?
                        }
                        Err(message) if message.is_empty() => {}
                        Err(message) => writeln!(output, "{message}")?,
                    }
                }
                alive = list.changed(), if live => {
                    if alive {
                        write!(output, "{}", list.render())?;
                    } else {
                        live = false;
                        tracing::warn!("Job feed stopped unexpectedly");
                    }
                }
            }
            output.flush()?;
        };

        list.deactivate().await;
        Ok(next)
    }

    async fn create_view<R, W>(
        &self,
        lines: &mut Lines<R>,
        output: &mut W,
    ) -> AppResult<Option<View>>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut form = CreateReportForm::new();
        write!(output, "{}", form.render())?;

        loop {
            output.flush()?;
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    return Ok(None);
                }
            };

            match parse_command(&line) {
                Ok(Command::SetType(value)) => form.report_type = value,
                Ok(Command::SetStart(value)) => form.start_date = value,
                Ok(Command::SetEnd(value)) => form.end_date = value,
                Ok(Command::Submit) => match form.submit(self.service.as_ref()).await {
                    SubmitOutcome::Created { job, next } => {
                        writeln!(output, "Report {} submitted.", job.id)?;
                        return Ok(Some(next));
                    }
                    SubmitOutcome::Incomplete => {
                        writeln!(output, "Fill in type, start and end first.")?;
                        continue;
                    }
                    SubmitOutcome::Invalid | SubmitOutcome::Failed => {}
                },
                Ok(Command::Cancel) => return Ok(Some(form.cancel())),
                Ok(Command::List) => return Ok(Some(View::ReportList)),
                Ok(Command::Go(path)) => match router::resolve(&path) {
                    Ok(View::CreateReport) => {}
                    Ok(other) => return Ok(Some(other)),
                    Err(e) => {
                        writeln!(output, "{e}")?;
                        continue;
                    }
                },
                Ok(Command::New) => {}
                Ok(Command::Help) => {
                    write!(output, "{HELP}")?;
                    continue;
                }
                Ok(Command::Quit) => return Ok(None),
                Err(message) if message.is_empty() => continue,
                Err(message) => {
                    writeln!(output, "{message}")?;
                    continue;
                }
            }
            write!(output, "{}", form.render())?;
        }
    }
}
