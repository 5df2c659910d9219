//! Clipboard targets for the "Copy" action.

use anyhow::Result;
use parking_lot::Mutex;

/// Every write replaces the previous contents.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;

    fn get_text(&self) -> Result<Option<String>>;
}

/// In-process clipboard, the default when no desktop clipboard is wanted.
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }

    fn get_text(&self) -> Result<Option<String>> {
        Ok(self.contents.lock().clone())
    }
}

/// The desktop clipboard through `arboard`.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(arboard::Clipboard::new()?),
        })
    }
}

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        self.inner.lock().set_text(text.to_string())?;
        Ok(())
    }

    fn get_text(&self) -> Result<Option<String>> {
        match self.inner.lock().get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
