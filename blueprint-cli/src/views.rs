//! Views - Everything the CLI writes for the user
//!
//! Generated configuration goes to stdout (or the `-out` file); diagnostics
//! go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;

use blueprint_core::addrs::AbsResourceInstance;
use blueprint_core::diagnostics::{Diagnostic, Diagnostics, Severity};
use blueprint_core::formatter::{self, FormatConfig, FormatParseError};
use blueprint_core::render::{RenderOptions, render_resource};
use blueprint_core::schema::Block;
use blueprint_core::value::Value;

use crate::arguments::{Add, ViewType};

/// Output streams shared by all commands
pub struct View {
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
    no_color: bool,
}

impl View {
    pub fn new(stdout: Box<dyn Write>, stderr: Box<dyn Write>, no_color: bool) -> Self {
        Self {
            stdout,
            stderr,
            no_color,
        }
    }

    /// View writing to the process streams
    pub fn stdio(no_color: bool) -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), no_color)
    }

    /// Print diagnostics to stderr
    pub fn diagnostics(&mut self, diags: &Diagnostics) {
        for diag in diags {
            let text = self.format_diagnostic(diag);
            if let Err(e) = self.stderr.write_all(text.as_bytes()) {
                log::error!("Failed to write diagnostics: {}", e);
                return;
            }
        }
        if let Err(e) = self.stderr.flush() {
            log::error!("Failed to write diagnostics: {}", e);
        }
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let label = match diag.severity {
            Severity::Error => "Error:",
            Severity::Warning => "Warning:",
        };
        let prefix = match (self.no_color, diag.severity) {
            (true, _) => label.to_string(),
            (false, Severity::Error) => label.red().bold().to_string(),
            (false, Severity::Warning) => label.yellow().bold().to_string(),
        };
        let summary = if self.no_color {
            diag.summary.clone()
        } else {
            diag.summary.bold().to_string()
        };

        let mut out = format!("\n{} {}\n", prefix, summary);
        if let Some(subject) = &diag.subject {
            out.push_str(&format!("\n  on {}\n", subject));
        }
        if !diag.detail.is_empty() {
            out.push('\n');
            out.push_str(&diag.detail);
            out.push('\n');
        }
        out
    }

    fn write_stdout(&mut self, text: &str) -> io::Result<()> {
        self.stdout.write_all(text.as_bytes())?;
        self.stdout.flush()
    }
}

/// Error writing the generated configuration
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to format generated configuration: {0}")]
    Format(#[from] FormatParseError),

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match self {
            RenderError::Format(_) => "Error formatting configuration",
            RenderError::WriteFile { .. } | RenderError::Io(_) => "Error writing configuration",
        };
        Diagnostic::error(summary, self.to_string())
    }
}

/// View of the `add` command
pub enum AddView {
    Human(AddHuman),
    Json(AddJson),
}

impl AddView {
    pub fn new(view_type: ViewType, view: View, args: &Add) -> Self {
        match view_type {
            ViewType::Human => AddView::Human(AddHuman {
                view,
                options: args.options.clone(),
            }),
            ViewType::Json => AddView::Json(AddJson { view }),
        }
    }

    /// Write the configuration block for `addr`
    pub fn resource(
        &mut self,
        addr: &AbsResourceInstance,
        schema: &Block,
        provider_alias: Option<&str>,
        prior: Option<&Value>,
    ) -> Result<(), RenderError> {
        match self {
            AddView::Human(human) => human.resource(addr, schema, provider_alias, prior),
            AddView::Json(json) => json.resource(addr),
        }
    }

    pub fn diagnostics(&mut self, diags: &Diagnostics) {
        match self {
            AddView::Human(human) => human.view.diagnostics(diags),
            AddView::Json(json) => json.view.diagnostics(diags),
        }
    }
}

pub struct AddHuman {
    view: View,
    options: RenderOptions,
}

impl AddHuman {
    fn resource(
        &mut self,
        addr: &AbsResourceInstance,
        schema: &Block,
        provider_alias: Option<&str>,
        prior: Option<&Value>,
    ) -> Result<(), RenderError> {
        let text = render_resource(addr, schema, provider_alias, prior, &self.options);

        let output = if self.options.defaults {
            log::trace!("Formatting generated configuration for {}", addr);
            formatter::format(&text, &FormatConfig::default())?
        } else {
            format!("{}\n", text.trim_end())
        };

        match &self.options.out_path {
            Some(path) => {
                log::debug!("Writing configuration to {}", path.display());
                std::fs::write(path, output).map_err(|source| RenderError::WriteFile {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(self.view.write_stdout(&output)?),
        }
    }
}

/// Machine-readable view; produces no output yet
pub struct AddJson {
    view: View,
}

impl AddJson {
    fn resource(&mut self, addr: &AbsResourceInstance) -> Result<(), RenderError> {
        log::debug!("JSON output is not available; nothing written for {}", addr);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use super::View;

    /// In-memory stream whose contents stay readable after the view is dropped
    #[derive(Clone, Default)]
    pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub fn test_view() -> (View, SharedBuf, SharedBuf) {
        let stdout = SharedBuf::default();
        let stderr = SharedBuf::default();
        let view = View::new(Box::new(stdout.clone()), Box::new(stderr.clone()), true);
        (view, stdout, stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::test_view;
    use super::*;
    use blueprint_core::diagnostics::{Pos, SourceRange};
    use blueprint_core::schema::{Attribute, Type};

    fn add_args(options: RenderOptions, view_type: ViewType) -> Add {
        Add {
            addr: AbsResourceInstance::parse("test_instance.new").unwrap(),
            from_existing: None,
            options,
            view_type,
        }
    }

    fn schema() -> Block {
        Block::new()
            .attribute("ami", Attribute::typed(Type::String).optional())
            .attribute("value", Attribute::typed(Type::String).required())
    }

    #[test]
    fn test_diagnostics_plain() {
        let (mut view, _, stderr) = test_view();
        let mut diags = Diagnostics::new();
        diags.push(
            Diagnostic::error("Resource already in configuration", "Already there.").with_subject(
                SourceRange {
                    filename: "main.tf".to_string(),
                    start: Pos { line: 1, column: 1 },
                    end: Pos {
                        line: 1,
                        column: 34,
                    },
                },
            ),
        );
        diags.push(Diagnostic::warning("Careful", ""));
        view.diagnostics(&diags);

        assert_eq!(
            stderr.contents(),
            "\nError: Resource already in configuration\n\n  on main.tf:1,1-34\n\nAlready there.\n\nWarning: Careful\n"
        );
    }

    /// Accepts writes but fails every flush
    struct BrokenFlush(super::testing::SharedBuf);

    impl Write for BrokenFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_diagnostics_survive_flush_error() {
        let stderr = super::testing::SharedBuf::default();
        let mut view = View::new(
            Box::new(io::sink()),
            Box::new(BrokenFlush(stderr.clone())),
            true,
        );
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("Careful", ""));
        view.diagnostics(&diags);
        assert_eq!(stderr.contents(), "\nWarning: Careful\n");
    }

    #[test]
    fn test_human_writes_block_with_newline() {
        let (view, stdout, _) = test_view();
        let args = add_args(RenderOptions::default(), ViewType::Human);
        let mut add_view = AddView::new(args.view_type, view, &args);
        add_view
            .resource(&args.addr, &schema(), None, None)
            .unwrap();
        assert_eq!(
            stdout.contents(),
            "resource \"test_instance\" \"new\" {\n  value = <REQUIRED string>\n}\n"
        );
    }

    #[test]
    fn test_human_formats_defaults() {
        let (view, stdout, _) = test_view();
        let options = RenderOptions {
            defaults: true,
            optional: true,
            ..Default::default()
        };
        let args = add_args(options, ViewType::Human);
        let mut add_view = AddView::new(args.view_type, view, &args);
        add_view
            .resource(&args.addr, &schema(), Some("othertest"), None)
            .unwrap();
        assert_eq!(
            stdout.contents(),
            "resource \"test_instance\" \"new\" {\n  provider = othertest\n  ami      = null\n  value    = null\n}\n"
        );
    }

    #[test]
    fn test_human_writes_out_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.tf");
        std::fs::write(&path, "old contents").unwrap();

        let (view, stdout, _) = test_view();
        let options = RenderOptions {
            out_path: Some(path.clone()),
            ..Default::default()
        };
        let args = add_args(options, ViewType::Human);
        let mut add_view = AddView::new(args.view_type, view, &args);
        add_view
            .resource(&args.addr, &schema(), None, None)
            .unwrap();

        assert!(stdout.contents().is_empty());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "resource \"test_instance\" \"new\" {\n  value = <REQUIRED string>\n}\n"
        );
    }

    #[test]
    fn test_out_file_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (view, _, _) = test_view();
        let options = RenderOptions {
            out_path: Some(dir.path().join("missing").join("generated.tf")),
            ..Default::default()
        };
        let args = add_args(options, ViewType::Human);
        let mut add_view = AddView::new(args.view_type, view, &args);
        let err = add_view
            .resource(&args.addr, &schema(), None, None)
            .unwrap_err();
        assert!(matches!(err, RenderError::WriteFile { .. }));
        assert_eq!(err.to_diagnostic().summary, "Error writing configuration");
    }

    #[test]
    fn test_json_writes_nothing() {
        let (view, stdout, stderr) = test_view();
        let args = add_args(RenderOptions::default(), ViewType::Json);
        let mut add_view = AddView::new(args.view_type, view, &args);
        assert!(matches!(add_view, AddView::Json(_)));
        add_view
            .resource(&args.addr, &schema(), None, None)
            .unwrap();
        assert!(stdout.contents().is_empty());
        assert!(stderr.contents().is_empty());
    }
}
