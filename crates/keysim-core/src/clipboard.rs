use parking_lot::Mutex;

lazy_static::lazy_static! {
    static ref SYSTEM_CLIPBOARD: Mutex<String> = Mutex::new(String::new());
}

/// External clipboard collaborator used by cut, copy and paste.
pub trait Clipboard {
    fn read(&self) -> String;
    fn write(&mut self, text: String);
}

/// Process-wide clipboard shared by every typing call. Last writer wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn read(&self) -> String {
        SYSTEM_CLIPBOARD.lock().clone()
    }

    fn write(&mut self, text: String) {
        *SYSTEM_CLIPBOARD.lock() = text;
    }
}

/// Clipboard owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalClipboard(pub String);

impl Clipboard for LocalClipboard {
    fn read(&self) -> String {
        self.0.clone()
    }

    fn write(&mut self, text: String) {
        self.0 = text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clipboard_is_shared() {
        let mut a = SystemClipboard;
        let b = SystemClipboard;
        a.write("shared text".to_string());
        assert_eq!(b.read(), "shared text");
    }

    #[test]
    fn test_local_clipboard_last_writer_wins() {
        let mut clip = LocalClipboard::default();
        clip.write("one".into());
        clip.write("two".into());
        assert_eq!(clip.read(), "two");
    }
}
