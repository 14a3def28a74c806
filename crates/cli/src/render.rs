//! Plain-text rendering for terminal output.

use segment_client::PreviewResult;
use segment_core::{
    AttributeCatalog, AttributeSchema, BuilderError, Condition, ConditionIssue, SegmentFilter,
};

pub(crate) fn attribute_line(attr: &AttributeSchema) -> String {
    let operators: Vec<&str> = attr.operators.iter().map(|op| op.as_str()).collect();
    let mut line = format!(
        "{:<20} {:<8} {:<24} {}",
        attr.key,
        attr.kind.to_string(),
        attr.label,
        operators.join(", ")
    );
    if !attr.options.is_empty() {
        let options: Vec<&str> = attr.options.iter().map(|o| o.value.as_str()).collect();
        line.push_str(&format!(" [{}]", options.join(" | ")));
    }
    line
}

/// `#1  Balance gt 100`, numbered from 1.
pub(crate) fn condition_line(index: usize, condition: &Condition, catalog: &AttributeCatalog) -> String {
    let attribute = if condition.key.is_empty() {
        "<attribute?>".to_string()
    } else {
        catalog
            .get(&condition.key)
            .map(|a| a.label.clone())
            .unwrap_or_else(|| condition.key.clone())
    };
    let operator = condition.operator.map(|op| op.as_str()).unwrap_or("<operator?>");
    let mut line = format!("#{:<2} {} {}", index + 1, attribute, operator);
    if !condition.value.is_none() {
        line.push(' ');
        line.push_str(&condition.value.to_string());
    }
    if !condition.is_complete() {
        line.push_str("  (incomplete)");
    }
    line
}

pub(crate) fn filter_lines(filter: &SegmentFilter, catalog: &AttributeCatalog) -> Vec<String> {
    if filter.conditions.is_empty() {
        return vec!["(no conditions)".to_string()];
    }
    let mut lines = Vec::with_capacity(filter.conditions.len() + 1);
    if filter.conditions.len() > 1 {
        lines.push(format!("match {} of:", filter.logic));
    }
    for (i, condition) in filter.conditions.iter().enumerate() {
        lines.push(condition_line(i, condition, catalog));
    }
    lines
}

/// Builder errors without the zero-based index, for messages that already
/// name the condition.
pub(crate) fn builder_error(error: &BuilderError) -> String {
    match error {
        BuilderError::InvalidValue { source, .. } => source.to_string(),
        BuilderError::MissingAttribute { .. } => "no attribute selected".to_string(),
        BuilderError::MissingOperator { .. } => "no operator selected".to_string(),
        BuilderError::IndexOutOfRange { len, .. } => format!("no such condition (have {})", len),
        other => other.to_string(),
    }
}

pub(crate) fn issue_line(issue: &ConditionIssue) -> String {
    match issue {
        ConditionIssue::Rejected { index, error } => {
            format!("#{}: {}", index + 1, builder_error(error))
        }
        ConditionIssue::Incomplete { index } => format!("#{}: incomplete", index + 1),
    }
}

pub(crate) fn preview_lines(result: &PreviewResult) -> Vec<String> {
    let mut lines = vec![format!("{} matching contacts", result.total_count)];
    for contact in &result.preview_contacts {
        lines.push(format!("  - {}", contact.display_name()));
    }
    lines
}
