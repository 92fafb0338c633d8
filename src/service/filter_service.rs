//! Filter invocation service.

use tracing::{debug, error, info};

use crate::config::Config;
use crate::domain::filters::{FilterArgs, FilterRegistry, ProcessFilter, TextFilter};
use crate::domain::{
    AggregateResult, FilterError, RegionReplacer, ReplaceReport, ReportingPolicy, StatusSink,
    TextBuffer,
};

/// Base-command toggles that can be overridden per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationOptions {
    pub use_selections: bool,
    pub errors_on_statusbar: bool,
    pub reporting: ReportingPolicy,
}

impl InvocationOptions {
    const KEYS: &'static [&'static str] = &[
        "use_selections",
        "errors_on_statusbar",
        "report_success",
        "report_failure",
        "report_nochange",
    ];

    /// Defaults taken from the configuration file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            use_selections: config.use_selections,
            errors_on_statusbar: config.errors_on_statusbar,
            reporting: config.reporting(),
        }
    }

    /// Remove the toggles from `args` and apply them over the config defaults.
    pub fn split_from(args: &mut FilterArgs, config: &Config) -> Result<Self, FilterError> {
        let mut options = Self::from_config(config);
        let mut toggles = FilterArgs::new();
        for key in Self::KEYS {
            if let Some(value) = args.take(key) {
                toggles.insert(key, value);
            }
        }

        if let Some(v) = toggles.get_bool("use_selections")? {
            options.use_selections = v;
        }
        if let Some(v) = toggles.get_bool("errors_on_statusbar")? {
            options.errors_on_statusbar = v;
        }
        if let Some(v) = toggles.get_bool("report_success")? {
            options.reporting.report_success = v;
        }
        if let Some(v) = toggles.get_bool("report_failure")? {
            options.reporting.report_failure = v;
        }
        if let Some(v) = toggles.get_bool("report_nochange")? {
            options.reporting.report_nochange = v;
        }

        Ok(options)
    }
}

/// A resolved request to run one filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Caption of the declared command, when invoked by caption
    pub caption: Option<String>,
    pub filter_id: String,
    pub args: FilterArgs,
}

impl Invocation {
    pub fn new(filter_id: &str, args: FilterArgs) -> Self {
        Self {
            caption: None,
            filter_id: filter_id.to_string(),
            args,
        }
    }

    /// Pipe through a shell command line, as typed at a prompt.
    pub fn shell(command: &str) -> Self {
        Self::new(
            ProcessFilter::ID,
            FilterArgs::new().with("command", command).with("shell", true),
        )
    }

    /// Name for logs and messages.
    pub fn name(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.filter_id)
    }
}

/// Service for running filter invocations against a buffer.
pub struct FilterService {
    config: Config,
    registry: FilterRegistry,
}

impl FilterService {
    /// Create a new FilterService.
    pub fn new(config: Config, registry: FilterRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve `name` to an invocation.
    ///
    /// Declared captions take precedence over filter ids. `overrides` are
    /// laid over the declared args.
    pub fn resolve(&self, name: &str, overrides: &FilterArgs) -> Result<Invocation, FilterError> {
        if let Some(command) = self.config.command(name) {
            let mut args = command.filter_args();
            args.merge(overrides);
            return Ok(Invocation {
                caption: Some(command.caption.clone()),
                filter_id: command.filter_id.clone(),
                args,
            });
        }

        if self.registry.contains(name) {
            return Ok(Invocation::new(name, overrides.clone()));
        }

        Err(FilterError::UnknownFilter(name.to_string()))
    }

    /// Run one invocation against `buffer` and report its outcome.
    ///
    /// Configuration errors are reported and returned before any span is
    /// filtered. Span failures are part of the returned report.
    pub fn invoke<B: TextBuffer + ?Sized>(
        &self,
        buffer: &mut B,
        invocation: &Invocation,
        status: &dyn StatusSink,
    ) -> Result<ReplaceReport, FilterError> {
        debug!(
            "Invoking '{}' (filter={}, args={:?})",
            invocation.name(),
            invocation.filter_id,
            invocation.args
        );

        let mut args = invocation.args.clone();
        let options = match InvocationOptions::split_from(&mut args, &self.config) {
            Ok(options) => options,
            Err(e) => {
                return Err(self.setup_failed(e, self.config.errors_on_statusbar, status));
            }
        };

        let filter = match self
            .registry
            .build(&invocation.filter_id, &args, &self.config.filter_context())
        {
            Ok(filter) => filter,
            Err(e) => return Err(self.setup_failed(e, options.errors_on_statusbar, status)),
        };

        let report = RegionReplacer::new(options.use_selections).apply(buffer, filter.as_ref());
        self.report(&report, filter.as_ref(), &options, status);

        info!(
            "'{}' finished: result={:?} spans={} committed={}",
            invocation.name(),
            report.result,
            report.outcomes.len(),
            report.committed
        );

        Ok(report)
    }

    fn report(
        &self,
        report: &ReplaceReport,
        filter: &dyn TextFilter,
        options: &InvocationOptions,
        status: &dyn StatusSink,
    ) {
        if options.reporting.report(report, filter, status) {
            return;
        }
        // With failure reporting off, errors still reach the status bar.
        if report.result == AggregateResult::Failure && options.errors_on_statusbar {
            if let Some(e) = &report.error {
                status.status_message(&e.to_string());
            }
        }
    }

    fn setup_failed(
        &self,
        e: FilterError,
        errors_on_statusbar: bool,
        status: &dyn StatusSink,
    ) -> FilterError {
        error!("Invocation setup failed: {}", e);
        if errors_on_statusbar {
            status.status_message(&e.to_string());
        }
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentBuffer, RecordedStatus, Span};

    fn config(toml_text: &str) -> Config {
        toml::from_str(toml_text).unwrap()
    }

    fn service(toml_text: &str) -> FilterService {
        FilterService::new(config(toml_text), FilterRegistry::with_builtins())
    }

    const COMMANDS: &str = r#"
        [[commands]]
        caption = "Swap Quotes"
        filter_id = "translate"
        args = { before = "'\"", after = "\"'" }

        [[commands]]
        caption = "Hex"
        filter_id = "int_base"
        args = { from_base = 10, to_base = 16, use_selections = false }
    "#;

    #[test]
    fn test_resolve_caption_then_filter_id() {
        let service = service(COMMANDS);

        let by_caption = service.resolve("Swap Quotes", &FilterArgs::new()).unwrap();
        assert_eq!(by_caption.filter_id, "translate");
        assert_eq!(by_caption.caption.as_deref(), Some("Swap Quotes"));

        let by_id = service
            .resolve("base64", &FilterArgs::new().with("decode", true))
            .unwrap();
        assert_eq!(by_id.filter_id, "base64");
        assert!(by_id.caption.is_none());
        assert!(by_id.args.contains("decode"));

        assert!(matches!(
            service.resolve("Nothing", &FilterArgs::new()),
            Err(FilterError::UnknownFilter(_))
        ));
    }

    #[test]
    fn test_overrides_replace_declared_args() {
        let service = service(COMMANDS);
        let invocation = service
            .resolve("Hex", &FilterArgs::new().with("case", "upper"))
            .unwrap();
        let mut buffer = DocumentBuffer::new("255");
        let status = RecordedStatus::default();

        service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(buffer.text(), "0xFF");
    }

    #[test]
    fn test_invoke_success_message() {
        let service = service(COMMANDS);
        let invocation = service.resolve("Swap Quotes", &FilterArgs::new()).unwrap();
        let mut buffer = DocumentBuffer::with_selections("'a' 'b'", vec![Span::new(0, 3)]);
        let status = RecordedStatus::default();

        let report = service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(report.result, AggregateResult::Success);
        assert_eq!(buffer.text(), "\"a\" 'b'");
        assert_eq!(status.messages(), vec!["FilterPipes: success"]);
    }

    #[test]
    fn test_invocation_option_ignores_selections() {
        let service = service(COMMANDS);
        let invocation = service.resolve("Hex", &FilterArgs::new()).unwrap();
        let mut buffer = DocumentBuffer::with_selections("10 20", vec![Span::new(0, 2)]);
        let status = RecordedStatus::default();

        service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(buffer.text(), "0xa 0x14");
    }

    #[test]
    fn test_nochange_can_be_silenced() {
        let service = service("report_nochange = false");
        let invocation = Invocation::new("snake_case", FilterArgs::new());
        let mut buffer = DocumentBuffer::new("already_snake");
        let status = RecordedStatus::default();

        let report = service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(report.result, AggregateResult::NoChange);
        assert!(status.messages().is_empty());
    }

    #[test]
    fn test_configuration_error_reported_before_filtering() {
        let service = service("");
        let invocation = Invocation::new("int_base", FilterArgs::new().with("from_base", 7));
        let mut buffer = DocumentBuffer::new("123");
        let status = RecordedStatus::default();

        let err = service.invoke(&mut buffer, &invocation, &status).unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(buffer.text(), "123");
        assert_eq!(buffer.transactions(), 0);
        assert_eq!(status.messages().len(), 1);
        assert!(status.messages()[0].contains("unsupported base 7"));
    }

    #[test]
    fn test_errors_on_statusbar_off() {
        let service = service("errors_on_statusbar = false");
        let invocation = Invocation::new("nope", FilterArgs::new());
        let mut buffer = DocumentBuffer::new("x");
        let status = RecordedStatus::default();

        assert!(service.invoke(&mut buffer, &invocation, &status).is_err());
        assert!(status.messages().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_failure_is_not_a_decline() {
        let service = service("");
        let invocation = Invocation::shell("echo broken >&2; exit 1");
        let mut buffer = DocumentBuffer::new("text");
        let status = RecordedStatus::default();

        let report = service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(report.result, AggregateResult::Failure);
        assert_eq!(buffer.text(), "text");
        let messages = status.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Error 1 executing command [echo broken >&2; exit 1]"));
        assert!(messages[0].contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_failure_with_failure_reports_off() {
        let service = service("report_failure = false");
        let invocation = Invocation::shell("exit 2");
        let mut buffer = DocumentBuffer::new("text");
        let status = RecordedStatus::default();

        service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(status.messages().len(), 1);
        assert!(status.messages()[0].starts_with("Error 2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_success_message() {
        let service = service("");
        let invocation = Invocation::shell("tr a-z A-Z");
        let mut buffer = DocumentBuffer::new("abc");
        let status = RecordedStatus::default();

        service.invoke(&mut buffer, &invocation, &status).unwrap();

        assert_eq!(buffer.text(), "ABC");
        assert_eq!(status.messages(), vec!["Filtered through: tr a-z A-Z"]);
    }
}
