//! Runs per-link work off the calling thread and joins on it later.
//!
//! A job takes ownership of whatever it works on and hands it back from
//! `join`, so nothing it touches is shared while it runs.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{mpsc, Arc, Mutex, OnceLock},
    thread,
};

use log::warn;

/// How scheduled work is executed
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Scheduler {
    /// Jobs run on a process-wide pool of worker threads
    #[default]
    Threaded,
    /// Jobs run to completion inside `schedule`. Deterministic; used by tests
    /// and single-threaded hosts.
    Inline,
}

impl Scheduler {
    pub fn schedule<T, F>(&self, work: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        match self {
            Scheduler::Inline => JobHandle(JobState::Done(work())),
            Scheduler::Threaded => match WorkerPool::global() {
                Some(pool) => JobHandle(JobState::Running(pool.submit(work))),
                None => JobHandle(JobState::Done(work())),
            },
        }
    }

    /// Number of threads `Threaded` jobs share. 0 when no worker could be
    /// spawned and jobs run inline instead.
    pub fn worker_count() -> usize {
        WorkerPool::global().map_or(0, |pool| pool.workers)
    }
}

/// Completion handle for a scheduled job
pub struct JobHandle<T>(JobState<T>);

enum JobState<T> {
    Done(T),
    Running(mpsc::Receiver<thread::Result<T>>),
}

impl<T: Send + 'static> JobHandle<T> {
    /// Blocks until the job is done. A panic inside the job resumes on the
    /// joining thread.
    pub fn join(self) -> T {
        match self.0 {
            JobState::Done(output) => output,
            JobState::Running(result) => match result.recv() {
                Ok(Ok(output)) => output,
                Ok(Err(payload)) => panic::resume_unwind(payload),
                // workers live as long as the process and always report back
                Err(mpsc::RecvError) => unreachable!("worker dropped a job"),
            },
        }
    }

    /// Schedules `work` to run on this job's output once it completes.
    ///
    /// The pool takes jobs in submission order, so the job being waited on
    /// has always been picked up by another worker already.
    pub fn then<U, F>(self, scheduler: &Scheduler, work: F) -> JobHandle<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            JobHandle(JobState::Done(output)) => scheduler.schedule(move || work(output)),
            running => scheduler.schedule(move || work(running.join())),
        }
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct WorkerPool {
    queue: Mutex<mpsc::Sender<Job>>,
    workers: usize,
}

impl WorkerPool {
    fn global() -> Option<&'static WorkerPool> {
        static POOL: OnceLock<Option<WorkerPool>> = OnceLock::new();
        POOL.get_or_init(WorkerPool::spawn).as_ref()
    }

    fn spawn() -> Option<WorkerPool> {
        let wanted = thread::available_parallelism().map_or(4, |count| count.get()).max(2);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = 0;
        for index in 0..wanted {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("radome-worker-{}", index))
                .spawn(move || work_loop(&receiver));
            match spawned {
                Ok(_) => workers += 1,
                Err(err) => warn!("could not spawn worker thread: {}", err),
            }
        }
        if workers == 0 {
            return None;
        }
        Some(WorkerPool {
            queue: Mutex::new(sender),
            workers,
        })
    }

    fn submit<T, F>(&self, work: F) -> mpsc::Receiver<thread::Result<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (report, result) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            // the joiner may have been dropped; nobody is left to tell
            let _ = report.send(panic::catch_unwind(AssertUnwindSafe(work)));
        });
        let queue = self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(mpsc::SendError(job)) = queue.send(job) {
            // every worker is gone; run it here rather than lose it
            job();
        }
        result
    }
}

fn work_loop(receiver: &Mutex<mpsc::Receiver<Job>>) {
    loop {
        let next = receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .recv();
        match next {
            Ok(job) => job(),
            Err(mpsc::RecvError) => return,
        }
    }
}
