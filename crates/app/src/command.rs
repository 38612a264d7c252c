//! Console command protocol.
//!
//! Each input line maps onto one [`Command`]; the app loop executes it
//! against the services.

use std::path::PathBuf;
use std::str::FromStr;

use snare_domain::{Protocol, ProxySortColumn, SettingsPatch, SortDirection};
use thiserror::Error;

/// Screens of the control panel. Only the proxy view polls for traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Captured traffic.
    #[default]
    Proxy,
    /// Repeater tabs.
    Repeater,
    /// Unified debug log.
    Logs,
    /// Backend settings.
    Settings,
}

impl FromStr for View {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proxy" => Ok(Self::Proxy),
            "repeater" => Ok(Self::Repeater),
            "logs" => Ok(Self::Logs),
            "settings" => Ok(Self::Settings),
            other => Err(CommandError::invalid("view", other)),
        }
    }
}

/// Errors raised while parsing a command line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    /// A required argument is missing.
    #[error("{command}: missing {argument}")]
    Missing {
        /// Command name.
        command: &'static str,
        /// Argument name.
        argument: &'static str,
    },

    /// An argument could not be parsed.
    #[error("invalid {argument}: {value}")]
    Invalid {
        /// Argument name.
        argument: &'static str,
        /// Raw value.
        value: String,
    },
}

impl CommandError {
    fn invalid(argument: &'static str, value: &str) -> Self {
        Self::Invalid {
            argument,
            value: value.to_string(),
        }
    }
}

/// Commands sent from the console to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the command list.
    Help,
    /// Leave the loop.
    Quit,
    /// Switch screens.
    View(View),

    // --- Traffic ---
    /// List captured logs, optionally filtered by URL or method.
    ListLogs {
        /// Substring of the URL or method.
        filter: Option<String>,
    },
    /// Set the traffic table order.
    SortLogs {
        /// Column.
        column: ProxySortColumn,
        /// Direction.
        direction: SortDirection,
    },
    /// Fetch captured logs now.
    FetchLogs,
    /// Print a captured request and response.
    ShowLog {
        /// Log id.
        id: u64,
    },
    /// Print a captured request as cURL.
    CurlLog {
        /// Log id.
        id: u64,
    },
    /// Delete one captured log.
    DeleteLog {
        /// Log id.
        id: u64,
    },
    /// Delete every captured log.
    ClearLogs,
    /// Open a captured request in a new repeater tab.
    SendToRepeater {
        /// Log id.
        id: u64,
    },

    // --- Repeater tabs ---
    /// List tabs.
    ListTabs,
    /// Open a default tab.
    NewTab,
    /// Activate a tab by id prefix.
    SelectTab {
        /// Tab id prefix.
        id: String,
    },
    /// Close a tab by id prefix.
    CloseTab {
        /// Tab id prefix.
        id: String,
    },
    /// Close every tab.
    CloseAllTabs,
    /// Rename a tab.
    RenameTab {
        /// Tab id prefix.
        id: String,
        /// New label.
        name: String,
    },
    /// Order tabs by name.
    SortTabs,

    // --- Active tab ---
    /// Set the target host.
    SetHost(String),
    /// Set the target port.
    SetPort(String),
    /// Set the target protocol.
    SetProtocol(Protocol),
    /// Toggle redirect following.
    SetRedirects(bool),
    /// Replace the raw header block (`\n` separates lines).
    SetHeaders(String),
    /// Replace the body (`\n` separates lines).
    SetBody(String),
    /// Print the active request.
    ShowRequest,
    /// Send the active request.
    Send,
    /// Reset the active request.
    ClearRequest,
    /// Write the active tab to `repeater-tabs.json`.
    ExportTabs,
    /// Append tabs from a file.
    ImportTabs {
        /// File to read.
        path: PathBuf,
    },

    // --- Session ---
    /// Write a session snapshot.
    ExportSession,
    /// Load a session snapshot.
    ImportSession {
        /// File to read.
        path: PathBuf,
    },

    // --- Settings ---
    /// Print the backend settings.
    ShowSettings,
    /// Update one setting.
    SetSetting(SettingsPatch),

    // --- Debug log ---
    /// Print the debug log, optionally filtered.
    DebugLog {
        /// Substring of the message or URL.
        filter: Option<String>,
    },
    /// Clear the debug log and captured logs.
    DebugClear,
    /// Write the debug log to a file.
    DebugExport,
}

/// Usage text for `help`.
pub const HELP: &str = "\
view <proxy|repeater|logs|settings>
logs [filter] | sort-logs <column> [asc|desc] | fetch
show <id> | curl <id> | delete <id> | clear | repeat <id>
tabs | new-tab | tab <id> | close <id> | close-all | rename <id> <name> | sort-tabs
host <host> | port <port> | protocol <http|https> | redirects <on|off>
headers <raw> | body <raw> | request | send | reset
export-tabs | import-tabs <path> | export-session | import-session <path>
settings | set <field> <value>
debug [filter] | debug-clear | debug-export
help | quit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));
        let optional = || (!rest.is_empty()).then(|| rest.to_string());

        let command = match name {
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "view" => Self::View(required("view", "screen", rest)?.parse()?),

            "logs" => Self::ListLogs { filter: optional() },
            "sort-logs" => {
                let mut words = rest.split_whitespace();
                let column = words.next().ok_or(CommandError::Missing {
                    command: "sort-logs",
                    argument: "column",
                })?;
                let column = column
                    .parse()
                    .map_err(|_| CommandError::invalid("column", column))?;
                let direction = match words.next() {
                    Some(d) => d
                        .parse()
                        .map_err(|_| CommandError::invalid("direction", d))?,
                    None => SortDirection::Asc,
                };
                Self::SortLogs { column, direction }
            }
            "fetch" => Self::FetchLogs,
            "show" => Self::ShowLog {
                id: log_id("show", rest)?,
            },
            "curl" => Self::CurlLog {
                id: log_id("curl", rest)?,
            },
            "delete" => Self::DeleteLog {
                id: log_id("delete", rest)?,
            },
            "clear" => Self::ClearLogs,
            "repeat" => Self::SendToRepeater {
                id: log_id("repeat", rest)?,
            },

            "tabs" => Self::ListTabs,
            "new-tab" => Self::NewTab,
            "tab" => Self::SelectTab {
                id: required("tab", "id", rest)?.to_string(),
            },
            "close" => Self::CloseTab {
                id: required("close", "id", rest)?.to_string(),
            },
            "close-all" => Self::CloseAllTabs,
            "rename" => {
                let (id, name) = required("rename", "id", rest)?
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Missing {
                        command: "rename",
                        argument: "name",
                    })?;
                Self::RenameTab {
                    id: id.to_string(),
                    name: name.trim().to_string(),
                }
            }
            "sort-tabs" => Self::SortTabs,

            "host" => Self::SetHost(required("host", "host", rest)?.to_string()),
            "port" => {
                let raw = required("port", "port", rest)?;
                Self::SetPort(port(raw)?.to_string())
            }
            "protocol" => {
                let raw = required("protocol", "protocol", rest)?;
                let protocol = raw
                    .parse()
                    .map_err(|_| CommandError::invalid("protocol", raw))?;
                Self::SetProtocol(protocol)
            }
            "redirects" => Self::SetRedirects(switch(required("redirects", "on|off", rest)?)?),
            "headers" => Self::SetHeaders(unescape(required("headers", "header block", rest)?)),
            "body" => Self::SetBody(unescape(rest)),
            "request" => Self::ShowRequest,
            "send" => Self::Send,
            "reset" => Self::ClearRequest,
            "export-tabs" => Self::ExportTabs,
            "import-tabs" => Self::ImportTabs {
                path: PathBuf::from(required("import-tabs", "path", rest)?),
            },

            "export-session" => Self::ExportSession,
            "import-session" => Self::ImportSession {
                path: PathBuf::from(required("import-session", "path", rest)?),
            },

            "settings" => Self::ShowSettings,
            "set" => {
                let (field, value) = required("set", "field", rest)?
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Missing {
                        command: "set",
                        argument: "value",
                    })?;
                Self::SetSetting(settings_patch(field, value.trim())?)
            }

            "debug" => Self::DebugLog { filter: optional() },
            "debug-clear" => Self::DebugClear,
            "debug-export" => Self::DebugExport,

            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    rest: &'a str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Missing { command, argument })
    } else {
        Ok(rest)
    }
}

fn log_id(command: &'static str, rest: &str) -> Result<u64, CommandError> {
    let raw = required(command, "log id", rest)?;
    raw.parse()
        .map_err(|_| CommandError::invalid("log id", raw))
}

fn switch(raw: &str) -> Result<bool, CommandError> {
    match raw {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(CommandError::invalid("switch", other)),
    }
}

/// Turns literal `\n` sequences into newlines.
fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

fn port(raw: &str) -> Result<u16, CommandError> {
    raw.parse().map_err(|_| CommandError::invalid("port", raw))
}

/// `null` clears a nullable field.
fn nullable<T>(
    raw: &str,
    parse: impl Fn(&str) -> Result<T, CommandError>,
) -> Result<Option<T>, CommandError> {
    if raw == "null" {
        Ok(None)
    } else {
        parse(raw).map(Some)
    }
}

/// Builds a one-field settings update.
fn settings_patch(field: &str, value: &str) -> Result<SettingsPatch, CommandError> {
    let text = |raw: &str| -> Result<String, CommandError> { Ok(raw.to_string()) };
    let mut patch = SettingsPatch::default();
    match field {
        "proxy_port" => patch.proxy_port = Some(port(value)?),
        "ui_port" => patch.ui_port = Some(port(value)?),
        "debug_level" => patch.debug_level = Some(value.to_string()),
        "enable_filtering" => patch.enable_filtering = Some(switch(value)?),
        "filter_rules" => {
            patch.filter_rules = Some(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        "upstream_proxy_enabled" => patch.upstream_proxy_enabled = Some(switch(value)?),
        "upstream_proxy_host" => patch.upstream_proxy_host = Some(nullable(value, text)?),
        "upstream_proxy_port" => patch.upstream_proxy_port = Some(nullable(value, port)?),
        "upstream_proxy_auth" => patch.upstream_proxy_auth = Some(switch(value)?),
        "upstream_proxy_username" => patch.upstream_proxy_username = Some(nullable(value, text)?),
        "upstream_proxy_password" => patch.upstream_proxy_password = Some(nullable(value, text)?),
        other => return Err(CommandError::invalid("setting", other)),
    }
    Ok(patch)
}
