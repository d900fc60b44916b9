//! User-facing notifications.

/// Shows messages the user has to acknowledge.
pub trait Notifier {
    fn error(&mut self, title: &str, detail: &str);
}

/// Blocking native message box.
#[derive(Debug, Default)]
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn error(&mut self, title: &str, detail: &str) {
        log::error!("{}: {}", title, detail);
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(detail)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
