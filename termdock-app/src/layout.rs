//! Layout document and persisted panel identities
//!
//! The workspace layout is a line-oriented text document written and read
//! as one blob: a header, an optional host-frame rectangle, and one line
//! per open panel carrying its dock state and persisted identity. Identity
//! strings come in two formats, the current query form
//! `ctlPuttyPanel?SessionId=<url-encoded id>` and a legacy colon form
//! `ctlPuttyPanel:<raw id>`, and both feed the same parser. Malformed or
//! unresolvable entries are dropped on restore, never fatal.

use std::fmt;
use std::path::Path;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::warn;

use termdock_session::DockState;
use termdock_utils::{Result, TermdockError};

use crate::winsys::Rect;

/// Panel kind literal for terminal panels (kept for layout compatibility
/// with previously persisted workspaces)
pub const KIND_TERMINAL: &str = "ctlPuttyPanel";
/// Panel kind literal for the fixed session-tree panel
pub const KIND_SESSION_TREE: &str = "SessionTreeview";

const LAYOUT_HEADER: &str = "termdock-layout v1";

/// Characters escaped inside a persisted session id
const SESSION_ID_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'?')
    .add(b'&')
    .add(b'=')
    .add(b'%')
    .add(b'#')
    .add(b':');

/// Panel species, as recorded in persisted identities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Terminal,
    SessionTree,
}

/// Structured persisted identity of a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistId {
    pub panel_kind: PanelKind,
    /// Present for terminal panels, absent for the session tree
    pub session_id: Option<String>,
}

impl PersistId {
    pub fn terminal(session_id: impl Into<String>) -> Self {
        Self {
            panel_kind: PanelKind::Terminal,
            session_id: Some(session_id.into()),
        }
    }

    pub fn session_tree() -> Self {
        Self {
            panel_kind: PanelKind::SessionTree,
            session_id: None,
        }
    }

    /// Parse either identity format.
    ///
    /// Kind names may arrive fully qualified (`SuperPutty.ctlPuttyPanel`);
    /// only the segment after the last `.` is compared. The session tree is
    /// matched on kind alone and any id payload is ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let (kind_part, session_id) = if let Some((kind, query)) = input.split_once('?') {
            (kind, parse_query_session_id(query))
        } else if let Some((kind, id)) = input.split_once(':') {
            // legacy form: raw id, no encoding
            (kind, (!id.is_empty()).then(|| id.to_string()))
        } else {
            (input, None)
        };

        let kind_name = kind_part.rsplit('.').next().unwrap_or(kind_part);
        match kind_name {
            KIND_TERMINAL => {
                let session_id = session_id.ok_or_else(|| {
                    TermdockError::PersistString(format!("no session id in {:?}", input))
                })?;
                Ok(Self::terminal(session_id))
            }
            KIND_SESSION_TREE => Ok(Self::session_tree()),
            _ => Err(TermdockError::PersistString(format!(
                "unknown panel kind in {:?}",
                input
            ))),
        }
    }
}

fn parse_query_session_id(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "SessionId")
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
        .filter(|id| !id.is_empty())
}

impl fmt::Display for PersistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.panel_kind, &self.session_id) {
            (PanelKind::SessionTree, _) => f.write_str(KIND_SESSION_TREE),
            (PanelKind::Terminal, Some(id)) => write!(
                f,
                "{}?SessionId={}",
                KIND_TERMINAL,
                utf8_percent_encode(id, SESSION_ID_ESCAPE)
            ),
            // terminal identities always carry an id by construction
            (PanelKind::Terminal, None) => f.write_str(KIND_TERMINAL),
        }
    }
}

/// One panel entry in the layout document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub persist_id: PersistId,
    pub dock_state: DockState,
}

/// Whole-workspace layout: host frame rectangle plus ordered panel entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDocument {
    pub frame: Option<Rect>,
    pub entries: Vec<LayoutEntry>,
}

impl LayoutDocument {
    /// Serialize to the line-oriented text format:
    ///
    /// ```text
    /// termdock-layout v1
    /// frame 100 80 1280 800
    /// panel dock_right SessionTreeview
    /// panel document ctlPuttyPanel?SessionId=web-01
    /// ```
    pub fn to_text(&self) -> String {
        let mut lines = vec![LAYOUT_HEADER.to_string()];
        if let Some(frame) = self.frame {
            lines.push(format!(
                "frame {} {} {} {}",
                frame.x, frame.y, frame.width, frame.height
            ));
        }
        for entry in &self.entries {
            lines.push(format!("panel {} {}", entry.dock_state, entry.persist_id));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    /// Parse a layout blob. Malformed lines are dropped with a warning;
    /// the result is whatever could be recovered, possibly empty.
    pub fn parse(text: &str) -> Self {
        let mut doc = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line == LAYOUT_HEADER {
                continue;
            }
            match line.split_once(' ') {
                Some(("frame", rest)) => match parse_frame(rest) {
                    Some(rect) => doc.frame = Some(rect),
                    None => warn!("dropping malformed frame line: {:?}", line),
                },
                Some(("panel", rest)) => match parse_panel(rest) {
                    Some(entry) => doc.entries.push(entry),
                    None => warn!("dropping malformed panel line: {:?}", line),
                },
                _ => warn!("dropping unrecognized layout line: {:?}", line),
            }
        }
        doc
    }

    /// Read and parse a layout file; a missing file is an empty layout
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| TermdockError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&text))
    }

    /// Write the document as one blob
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TermdockError::FileWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, self.to_text()).map_err(|e| TermdockError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn parse_frame(rest: &str) -> Option<Rect> {
    let mut parts = rest.split_whitespace().map(|p| p.parse::<i32>());
    let rect = Rect::new(
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
    );
    (rect.width > 0 && rect.height > 0).then_some(rect)
}

fn parse_panel(rest: &str) -> Option<LayoutEntry> {
    // the persist string is the remainder of the line; legacy ids may
    // contain spaces, so split only once
    let (state, persist) = rest.split_once(' ')?;
    let dock_state: DockState = state.parse().ok()?;
    let persist_id = PersistId::parse(persist.trim()).ok()?;
    Some(LayoutEntry {
        persist_id,
        dock_state,
    })
}
