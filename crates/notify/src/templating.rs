//! Minijinja template rendering for publication emails.
//!
//! Renders subject and body templates with access to the promotion, its
//! delegate, the timetable and the academic week it covers.
//!
//! Templates may be overridden from configuration, so they are arbitrary
//! strings and a fresh [`minijinja::Environment`] is created per render call.

use crate::traits::NotifyError;

/// Subject used when no override is configured.
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "{% if week %}Timetable {{ promotion.name }}: week {{ week.number }} \
({{ week.start_date }} to {{ week.end_date }}){% else %}Timetable {{ promotion.name }}{% endif %}";

/// Body used when no override is configured.
pub const DEFAULT_BODY_TEMPLATE: &str = "Hello {{ delegate.first_name }},

{% if week %}The timetable for week {{ week.number }}, from {{ week.start_date }} to {{ week.end_date }}, \
has been published for {{ promotion.name }}.{% else %}A new timetable has been published for {{ promotion.name }}.{% endif %}
{% if session_count %}It contains {{ session_count }} session{{ 's' if session_count != 1 }}.{% endif %}

You will find it attached as a PDF. Please share it with your class.
";

/// Context data available to publication templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    pub promotion: PromotionContext,
    pub delegate: DelegateContext,
    /// Absent when the timetable is not tied to a generated week.
    pub week: Option<WeekContext>,
    pub timetable: TimetableContext,
    pub session_count: usize,
    /// Current timestamp in ISO 8601 format.
    pub now: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PromotionContext {
    pub name: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DelegateContext {
    pub first_name: String,
    pub last_name: String,
}

/// Week fields, dates already formatted for display.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WeekContext {
    pub number: i32,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TimetableContext {
    pub id: String,
    pub title: Option<String>,
}

/// Renders notification templates using minijinja.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    subject_template: String,
    body_template: String,
}

impl TemplateRenderer {
    /// Renderer using the built-in subject and body templates.
    pub fn new() -> Self {
        Self {
            subject_template: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
        }
    }

    /// Renderer with optional overrides, validated up front.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if an override has syntax errors.
    pub fn with_overrides(
        subject: Option<&str>,
        body: Option<&str>,
    ) -> Result<Self, NotifyError> {
        let mut renderer = Self::new();
        if let Some(subject) = subject {
            Self::validate(subject)?;
            renderer.subject_template = subject.to_string();
        }
        if let Some(body) = body {
            Self::validate(body)?;
            renderer.body_template = body.to_string();
        }
        Ok(renderer)
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(template_str: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        let env = minijinja::Environment::new();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Render the `(subject, body)` pair.
    pub fn render_publication(&self, ctx: &TemplateContext) -> Result<(String, String), NotifyError> {
        let subject = Self::render(&self.subject_template, ctx)?;
        let body = Self::render(&self.body_template, ctx)?;
        // Subjects are single-line.
        let subject = subject.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok((subject, body))
    }

    /// Validate that a template string parses without errors.
    ///
    /// This does not evaluate the template, it only checks syntax.
    pub fn validate(template_str: &str) -> Result<(), NotifyError> {
        let env = minijinja::Environment::new();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
