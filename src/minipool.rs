use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::{Mutex, PoisonError};
use crossbeam_channel::Sender;
use crate::Error;

/// Runs `consumer` on `num_threads` scoped threads, fed by `producer` through a bounded channel.
///
/// The first consumer error stops the pool: workers stop taking messages, the producer's
/// sends start failing, and that first error is returned rather than the channel errors that follow it.
pub fn new<P, C, M, R>(num_threads: u8, name: &str, producer: P, consumer: C) -> Result<R, Error> where
    M: Send,
    C: Clone + Send + FnMut(M) -> Result<(), Error>,
    P: FnOnce(Sender<M>) -> Result<R, Error>,
{
    let failed = &AtomicBool::new(false);
    let first_error = &Mutex::new(None);
    let fail = move |e: Error| {
        if !failed.swap(true, SeqCst) {
            *first_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
        }
    };
    std::thread::scope(move |scope| {
        let (s, r) = crossbeam_channel::bounded(2);
        let thread = move || {
            let mut consumer = consumer;
            let res = catch_unwind(AssertUnwindSafe(move || {
                for m in r {
                    if failed.load(SeqCst) {
                        break;
                    }
                    if let Err(e) = consumer(m) {
                        fail(e);
                        break;
                    }
                }
            }));
            if res.is_err() {
                fail(Error::ThreadSend);
            }
        };
        let spawn = move |n, thread| {
            std::thread::Builder::new().name(format!("{name}{n}")).spawn_scoped(scope, thread).map_err(|_| {
                failed.store(true, SeqCst);
                Error::ThreadSend
            })
        };
        debug_assert!(num_threads > 0);
        let num_threads = num_threads.max(1);
        let mut handles = Vec::with_capacity(num_threads.into());
        for n in 0..num_threads-1 {
            handles.push(spawn(n, thread.clone())?);
        }
        handles.push(spawn(num_threads-1, thread)?);

        let res = producer(s);
        if res.is_err() {
            failed.store(true, SeqCst);
        }
        handles.into_iter().try_for_each(|h| h.join().map_err(|_| Error::ThreadSend))?;
        if let Some(e) = first_error.lock().unwrap_or_else(PoisonError::into_inner).take() {
            return Err(e);
        }
        res
    })
}
