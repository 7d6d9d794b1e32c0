use tokio::sync::watch;
use url::Url;

/// Link of the most recently acknowledged post.
///
/// Lives for the process lifetime only, starts empty. The owner is the only
/// writer; other tasks observe it through [`WatermarkReader`].
pub struct Watermark {
    tx: watch::Sender<Option<Url>>,
}

impl Watermark {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn get(&self) -> Option<Url> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, link: Url) {
        self.tx.send_replace(Some(link));
    }

    pub fn reader(&self) -> WatermarkReader {
        WatermarkReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct WatermarkReader {
    rx: watch::Receiver<Option<Url>>,
}

impl WatermarkReader {
    pub fn get(&self) -> Option<Url> {
        self.rx.borrow().clone()
    }
}
