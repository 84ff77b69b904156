//! HTML templates for transactional mail.

/// Password reset: button linking to the frontend reset page.
pub fn password_reset_html(reset_url: &str) -> String {
    format!(
        r#"<div style="font-family: sans-serif; background-color: #f4f4f4; padding: 20px;">
  <div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; padding: 20px; border-radius: 8px;">
    <h1 style="color: #333333; text-align: center;">Password reset</h1>
    <p style="font-size: 16px; color: #555555;">Hello,</p>
    <p style="font-size: 16px; color: #555555;">
      You asked to reset your password. Click the button below to choose a new one.
    </p>
    <div style="text-align: center; margin: 30px 0;">
      <a href="{reset_url}" style="background-color: #3498db; color: #ffffff; padding: 12px 20px; border-radius: 4px; text-decoration: none; font-size: 16px;">
        Reset your password
      </a>
    </div>
    <p style="font-size: 14px; color: #888888;">
      If you did not ask for this reset, please ignore this email.
    </p>
  </div>
</div>"#
    )
}

pub fn password_reset_text() -> &'static str {
    "Click the button below to reset your password."
}

/// Signup confirmation link.
pub fn confirmation_html(confirmation_url: &str) -> String {
    format!(
        r#"<p>Welcome to the platform!</p>
<p>Please confirm your registration by following this link:</p>
<a href="{confirmation_url}">Confirm my registration</a>"#
    )
}

pub fn confirmation_text(confirmation_url: &str) -> String {
    format!(
        "Please confirm your registration by following this link: {}",
        confirmation_url
    )
}

/// Contact-form relay to the site inbox.
pub fn contact_html(sender_email: &str, subject: &str, message: &str) -> String {
    format!(
        r#"<p><strong>From:</strong> {sender_email}</p>
<p><strong>Subject:</strong> {subject}</p>
<p><strong>Message:</strong></p>
<p>{message}</p>"#
    )
}

pub fn contact_text(sender_email: &str, subject: &str, message: &str) -> String {
    format!("From: {sender_email}\nSubject: {subject}\n\n{message}")
}
