use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::traits::dispatcher::{Task, UiDispatcher};

enum Message {
    Run(Task),
    RunAt(Instant, Task),
    Quit,
}

/// [`UiDispatcher`] backed by a dedicated thread.
///
/// Tasks run in post order; delayed tasks run once their deadline passes,
/// ordered by deadline. Tasks still pending at shutdown are dropped.
pub struct LooperThread {
    sender: Mutex<Option<Sender<Message>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LooperThread {
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_loop(receiver))?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop the loop after the task currently running and join the thread.
    /// Must not be called from a task on this looper.
    pub fn shutdown(&self) {
        if let Some(sender) = self.sender.lock().take() {
            let _ = sender.send(Message::Quit);
        }
        if let Some(handle) = self.handle.lock().take() {
            // Dropped from one of its own tasks: the loop exits on its own.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("looper thread panicked");
            }
        }
    }

    fn send(&self, message: Message) {
        let delivered = match &*self.sender.lock() {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        };
        if !delivered {
            log::warn!("looper stopped, dropping task");
        }
    }
}

impl UiDispatcher for LooperThread {
    fn post(&self, task: Task) {
        self.send(Message::Run(task));
    }

    fn post_delayed(&self, delay: Duration, task: Task) {
        self.send(Message::RunAt(Instant::now() + delay, task));
    }
}

impl Drop for LooperThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(receiver: Receiver<Message>) {
    let mut delayed: BTreeMap<(Instant, u64), Task> = BTreeMap::new();
    let mut sequence = 0u64;
    loop {
        let now = Instant::now();
        while let Some(entry) = delayed.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let task = entry.remove();
            task();
        }

        let message = match delayed.keys().next() {
            Some(&(deadline, _)) => {
                match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        match message {
            Message::Run(task) => task(),
            Message::RunAt(deadline, task) => {
                sequence += 1;
                delayed.insert((deadline, sequence), task);
            }
            Message::Quit => break,
        }
    }
}

#[derive(Default)]
struct ManualQueue {
    now: Duration,
    sequence: u64,
    ready: VecDeque<Task>,
    delayed: BTreeMap<(Duration, u64), Task>,
}

impl ManualQueue {
    fn promote_due(&mut self) {
        while let Some(entry) = self.delayed.first_entry() {
            if entry.key().0 > self.now {
                break;
            }
            self.ready.push_back(entry.remove());
        }
    }
}

/// [`UiDispatcher`] pumped by its owner, with a virtual clock.
///
/// Nothing runs until [`ManualDispatcher::run_pending`] or
/// [`ManualDispatcher::advance`] is called, which makes interleavings
/// reproducible in tests and lets a foreign event loop drive the session.
#[derive(Default)]
pub struct ManualDispatcher {
    queue: Mutex<ManualQueue>,
}

impl ManualDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run ready tasks, including ones they post, until none are left.
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = {
                let mut queue = self.queue.lock();
                queue.promote_due();
                queue.ready.pop_front()
            };
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Move the virtual clock forward and run everything that became due.
    pub fn advance(&self, by: Duration) -> usize {
        self.queue.lock().now += by;
        self.run_pending()
    }

    /// Tasks waiting to run, delayed ones included.
    pub fn pending(&self) -> usize {
        let queue = self.queue.lock();
        queue.ready.len() + queue.delayed.len()
    }

    pub fn now(&self) -> Duration {
        self.queue.lock().now
    }
}

impl UiDispatcher for ManualDispatcher {
    fn post(&self, task: Task) {
        self.queue.lock().ready.push_back(task);
    }

    fn post_delayed(&self, delay: Duration, task: Task) {
        let mut queue = self.queue.lock();
        queue.sequence += 1;
        let key = (queue.now + delay, queue.sequence);
        queue.delayed.insert(key, task);
    }
}
