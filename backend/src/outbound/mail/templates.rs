//! Compiled-in mail templates with `{{name}}` placeholders.

use std::collections::BTreeMap;

use crate::domain::ports::{MailDeliveryError, MailTemplate};

const USER_INVITATION_BODY: &str = include_str!("templates/user_invitation.html");
const USER_INVITATION_SUBJECT: &str = "Finish your registration";

/// A template rendered for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Render `template` with `vars`, HTML-escaping every substituted value.
///
/// # Errors
///
/// [`MailDeliveryError::Template`] when a placeholder has no value or is left
/// unterminated.
pub fn render(
    template: MailTemplate,
    vars: &BTreeMap<String, String>,
) -> Result<RenderedMail, MailDeliveryError> {
    let (subject, body) = match template {
        MailTemplate::UserInvitation => (USER_INVITATION_SUBJECT, USER_INVITATION_BODY),
    };
    Ok(RenderedMail {
        subject: substitute(template, subject, vars)?,
        html: substitute(template, body, vars)?,
    })
}

fn substitute(
    template: MailTemplate,
    source: &str,
    vars: &BTreeMap<String, String>,
) -> Result<String, MailDeliveryError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        let (before, after_open) = rest.split_at(start);
        out.push_str(before);
        let inner = after_open.get(2..).unwrap_or_default();
        let Some(end) = inner.find("}}") else {
            return Err(MailDeliveryError::template(format!(
                "unterminated placeholder in {}",
                template.name()
            )));
        };
        let (raw_key, tail) = inner.split_at(end);
        let key = raw_key.trim();
        let value = vars.get(key).ok_or_else(|| {
            MailDeliveryError::template(format!("missing variable `{key}` for {}", template.name()))
        })?;
        push_escaped(&mut out, value);
        rest = tail.get(2..).unwrap_or_default();
    }
    out.push_str(rest);
    Ok(out)
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}
