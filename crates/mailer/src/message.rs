//! Reminder email payload and HTML rendering.
//!
//! Rendering is a pure function of the contact fields so it can be tested
//! without a transport.

/// The payload for one reminder email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEmail {
    /// Recipient address (the reminder owner's email).
    pub to: String,
    /// Contact display name, e.g. `"Ada Lovelace"`.
    pub contact_name: String,
    pub position: String,
    pub company_name: String,
    pub company_url: String,
    /// Optional free-text note the user attached when scanning.
    pub note: Option<String>,
}

impl ReminderEmail {
    /// Subject line referencing the contact.
    pub fn subject(&self) -> String {
        format!("Reminder: Connection with {}", self.contact_name)
    }

    /// HTML body listing the contact fields and, if present, the note.
    pub fn html_body(&self) -> String {
        let mut items = format!(
            "<li><strong>Name:</strong> {}</li>\n\
             <li><strong>Position:</strong> {}</li>\n\
             <li><strong>Company:</strong> {}</li>\n",
            escape_html(&self.contact_name),
            escape_html(&self.position),
            escape_html(&self.company_name),
        );
        if !self.company_url.is_empty() {
            let url = escape_html(&self.company_url);
            items.push_str(&format!(
                "<li><strong>Company URL:</strong> <a href=\"{url}\">{url}</a></li>\n"
            ));
        }
        if let Some(note) = &self.note {
            items.push_str(&format!(
                "<li><strong>Note:</strong> {}</li>\n",
                escape_html(note)
            ));
        }
        format!(
            "<h2>Connection Reminder</h2>\n\
             <p>Hello! This is a reminder about your connection with:</p>\n\
             <ul>\n{items}</ul>\n\
             <p>Best regards,<br>Your Networking Assistant</p>"
        )
    }
}

/// Minimal HTML escaping for interpolated contact fields.
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
