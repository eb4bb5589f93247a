use crate::data_models::Record;
use log::debug;

/// Something the host notifies once per finished archive record.
pub trait ArchiveListener {
    fn new_archive_record(&self, record: &mut Record);
}

impl<F> ArchiveListener for F
where
    F: Fn(&mut Record),
{
    fn new_archive_record(&self, record: &mut Record) {
        self(record)
    }
}

/// Minimal host: listeners are called in bind order, synchronously.
#[derive(Default)]
pub struct Engine {
    listeners: Vec<Box<dyn ArchiveListener>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<L>(&mut self, listener: L)
    where
        L: ArchiveListener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn dispatch_new_archive_record(&self, record: &mut Record) {
        debug!(
            "Dispatching new archive record to {} listeners",
            self.listeners.len()
        );
        for listener in &self.listeners {
            listener.new_archive_record(record);
        }
    }
}
