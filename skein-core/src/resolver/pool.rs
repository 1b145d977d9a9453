// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::trace;

use crate::error::Error;
use crate::util::Spinlock;

const NUM_SEGMENTS: usize = 16;

static THREAD_COUNTER: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Segment assigned to the current thread, round-robin on first use.
    static SEGMENT: Cell<usize> =
        Cell::new(THREAD_COUNTER.fetch_add(1, Ordering::Relaxed) % NUM_SEGMENTS);
}

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;
type Recycle<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// Thread-sharded pool of reusable per-operation state.
///
/// Each thread is pinned to one of sixteen segments so that concurrent
/// operations rarely contend on the same lock. An item is only returned
/// to the pool after the operation that borrowed it succeeded; items
/// touched by a failed operation are dropped.
pub struct Pool<T> {
    segments: [Spinlock<Vec<T>>; NUM_SEGMENTS],
    factory: Factory<T>,
    recycle: Recycle<T>,
}

impl<T> Pool<T> {
    pub fn new<F, R>(factory: F, recycle: R) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        Pool {
            segments: std::array::from_fn(|_| Spinlock::new(Vec::new())),
            factory: Box::new(factory),
            recycle: Box::new(recycle),
        }
    }

    /// Runs `handler` with a pooled item.
    pub fn borrow_mut<R>(
        &self,
        handler: impl FnOnce(&mut T) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let segment = &self.segments[SEGMENT.with(Cell::get)];
        let pooled = segment.lock().pop();
        let mut item = pooled.unwrap_or_else(|| (self.factory)());
        let result = handler(&mut item);
        match &result {
            Ok(_) => {
                (self.recycle)(&mut item);
                segment.lock().push(item);
                trace!("returned item to pool segment");
            }
            Err(err) => trace!("discarding pooled item after failure: {}", err),
        }
        result
    }

    /// Number of idle items across all segments.
    pub fn idle(&self) -> usize {
        self.segments.iter().map(|s| s.lock().len()).sum()
    }
}
