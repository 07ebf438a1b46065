use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::engine::{CallSite, Resolution};

/// Outcome of one call site: either the resolved target or the error text.
#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    /// Where the call was written: the unit itself, or the synthesized
    /// method whose body contains it.
    pub context: String,

    pub kind: String,
    pub receiver: String,
    pub call: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Resolution>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallReport {
    pub fn resolved(context: impl Into<String>, site: &CallSite, resolution: Resolution) -> Self {
        Self {
            context: context.into(),
            kind: site.kind.to_string(),
            receiver: site.receiver.clone(),
            call: site.signature.to_string(),
            resolved: Some(resolution),
            error: None,
        }
    }

    pub fn failed(context: impl Into<String>, site: &CallSite, error: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            kind: site.kind.to_string(),
            receiver: site.receiver.clone(),
            call: site.signature.to_string(),
            resolved: None,
            error: Some(error.into()),
        }
    }

    /// A requested instantiation that never produced a class; there is no
    /// call site to attach it to.
    pub fn instantiation_failed(
        context: impl Into<String>,
        template: impl Into<String>,
        request: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            kind: "instantiate".to_string(),
            receiver: template.into(),
            call: request.into(),
            resolved: None,
            error: Some(error.into()),
        }
    }
}

/// Everything that happened while processing one unit document.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub file: String,

    /// Class nodes known once requested instantiations were performed.
    pub classes: usize,

    pub calls: Vec<CallReport>,

    /// Set when the unit never produced a usable session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitReport {
    pub fn new(file: impl Into<String>, classes: usize, calls: Vec<CallReport>) -> Self {
        Self {
            file: file.into(),
            classes,
            calls,
            error: None,
        }
    }

    pub fn failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            classes: 0,
            calls: vec![],
            error: Some(error.into()),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.error.is_some() || self.calls.iter().any(|c| c.error.is_some())
    }
}

#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub units: usize,
    pub resolved_calls: usize,
    pub failed_calls: usize,
    pub reports: Vec<UnitReport>,
}

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format(reports: Vec<UnitReport>, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&Self::build_output(reports))?),
            OutputFormat::Text => Ok(Self::render_text(&reports)),
        }
    }

    pub fn build_output(reports: Vec<UnitReport>) -> JsonOutput {
        let resolved_calls = reports
            .iter()
            .flat_map(|r| r.calls.iter())
            .filter(|c| c.resolved.is_some())
            .count();
        let failed_calls = reports
            .iter()
            .flat_map(|r| r.calls.iter())
            .filter(|c| c.error.is_some())
            .count();

        JsonOutput {
            units: reports.len(),
            resolved_calls,
            failed_calls,
            reports,
        }
    }

    fn render_text(reports: &[UnitReport]) -> String {
        let mut out = String::new();
        for report in reports {
            out.push_str(&format!("unit {} ({} classes)\n", report.file, report.classes));
            if let Some(error) = &report.error {
                out.push_str(&format!("  error: {error}\n"));
                continue;
            }
            for call in &report.calls {
                match (&call.resolved, &call.error) {
                    (Some(resolution), _) => {
                        let body = resolution
                            .body
                            .as_deref()
                            .map(|b| format!(" [{b}]"))
                            .unwrap_or_default();
                        out.push_str(&format!(
                            "  {} {} {}::{} -> {}::{}{}\n",
                            call.context,
                            call.kind,
                            call.receiver,
                            call.call,
                            resolution.owner,
                            resolution.signature,
                            body,
                        ));
                    }
                    (None, Some(error)) => {
                        let target = if call.kind == "instantiate" {
                            call.call.clone()
                        } else {
                            format!("{}::{}", call.receiver, call.call)
                        };
                        out.push_str(&format!(
                            "  {} {} {} -> error: {}\n",
                            call.context, call.kind, target, error,
                        ));
                    }
                    (None, None) => {}
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CallKind, Signature};

    fn sample_site() -> CallSite {
        CallSite::new(
            CallKind::Virtual,
            "Widget",
            Signature::new("add", vec!["int".to_string(), "int".to_string()]),
        )
    }

    fn sample_resolution() -> Resolution {
        Resolution {
            owner: "Widget".to_string(),
            signature: Signature::new("add", vec!["int".to_string(), "int".to_string()]),
            is_virtual: true,
            overrides: None,
            body: Some("widget.cpp:10".to_string()),
        }
    }

    #[test]
    fn test_output_counts() {
        let site = sample_site();
        let reports = vec![UnitReport::new(
            "a.json",
            3,
            vec![
                CallReport::resolved("a.cpp", &site, sample_resolution()),
                CallReport::failed("a.cpp", &site, "unknown identity: Ghost"),
            ],
        )];
        let output = ReportFormatter::build_output(reports);
        assert_eq!(output.units, 1);
        assert_eq!(output.resolved_calls, 1);
        assert_eq!(output.failed_calls, 1);
    }

    #[test]
    fn test_json_format_skips_empty_fields() {
        let site = sample_site();
        let report = CallReport::resolved("a.cpp", &site, sample_resolution());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["resolved"]["owner"], "Widget");
    }

    #[test]
    fn test_text_render_resolved_line() {
        let site = sample_site();
        let reports = vec![UnitReport::new(
            "units/a.json",
            2,
            vec![CallReport::resolved("a.cpp", &site, sample_resolution())],
        )];
        let text = ReportFormatter::format(reports, OutputFormat::Text).unwrap();
        assert!(text.contains("unit units/a.json (2 classes)"));
        assert!(text.contains(
            "a.cpp virtual Widget::add(int, int) -> Widget::add(int, int) [widget.cpp:10]"
        ));
    }

    #[test]
    fn test_text_render_failed_instantiation() {
        let reports = vec![UnitReport::new(
            "a.json",
            1,
            vec![CallReport::instantiation_failed(
                "a.cpp",
                "Pair",
                "Pair<A>",
                "template Pair expects 2 argument(s), got 1",
            )],
        )];
        let text = ReportFormatter::format(reports, OutputFormat::Text).unwrap();
        assert!(text.contains(
            "a.cpp instantiate Pair<A> -> error: template Pair expects 2 argument(s), got 1"
        ));
    }

    #[test]
    fn test_text_render_failed_unit() {
        let reports = vec![UnitReport::failed("b.json", "cyclic inheritance: A -> B -> A")];
        let text = ReportFormatter::format(reports, OutputFormat::Text).unwrap();
        assert!(text.contains("error: cyclic inheritance: A -> B -> A"));
    }

    #[test]
    fn test_has_failures() {
        let site = sample_site();
        let clean = UnitReport::new(
            "a.json",
            1,
            vec![CallReport::resolved("a.cpp", &site, sample_resolution())],
        );
        assert!(!clean.has_failures());

        let broken = UnitReport::new(
            "a.json",
            1,
            vec![CallReport::failed("a.cpp", &site, "boom")],
        );
        assert!(broken.has_failures());
        assert!(UnitReport::failed("c.json", "io").has_failures());
    }
}
