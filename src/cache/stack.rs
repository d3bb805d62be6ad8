use log::warn;

use crate::error::{MathError, MathResult};

use super::pool::{Pool, Poolable};

/// Combination rule applied when a value is pushed onto a [`CacheStack`].
pub trait Stackable: Poolable {
    /// Folds `arg` into the accumulated value.
    fn modify(&mut self, arg: &Self);

    /// Overwrites `self` with `other`.
    fn copy_from(&mut self, other: &Self);
}

/// Push/pop stack of pooled values that accumulates composed transforms.
///
/// Each frame is checked out of a [`Pool`] on `push` and returned to it on
/// `pop`; the caller passes the same pool to both.
#[derive(Debug)]
pub struct CacheStack<T: Stackable> {
    frames: Vec<T>,
}

impl<T: Stackable> Default for CacheStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Stackable> CacheStack<T> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Opens a frame holding a copy of the current top (or the reset value).
    pub fn push(&mut self, pool: &mut Pool<T>) {
        let mut frame = pool.get_fresh();
        if let Some(top) = self.frames.last() {
            frame.copy_from(top);
        }
        self.frames.push(frame);
    }

    /// Folds `arg` into the top frame.
    pub fn modify(&mut self, arg: &T) -> MathResult<()> {
        let top = self.frames.last_mut().ok_or(MathError::EmptyStack)?;
        top.modify(arg);
        Ok(())
    }

    pub fn peek(&self) -> Option<&T> {
        self.frames.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.frames.last_mut()
    }

    /// Closes the top frame and releases it.
    ///
    /// # Panics
    ///
    /// Panics when the stack is empty; unbalanced pops are a caller bug.
    pub fn pop(&mut self, pool: &mut Pool<T>) {
        if self.try_pop(pool).is_err() {
            panic!("CacheStack::pop called on an empty stack");
        }
    }

    /// Like [`CacheStack::pop`] but reports the empty case as an error.
    pub fn try_pop(&mut self, pool: &mut Pool<T>) -> MathResult<()> {
        let frame = self.frames.pop().ok_or(MathError::EmptyStack)?;
        pool.release(frame);
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Releases every open frame.
    pub fn clear(&mut self, pool: &mut Pool<T>) {
        for frame in self.frames.drain(..).rev() {
            pool.release(frame);
        }
    }
}

impl<T: Stackable> Drop for CacheStack<T> {
    fn drop(&mut self) {
        if !self.frames.is_empty() {
            warn!(
                "transform stack dropped with {} open frame(s)",
                self.frames.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Matrix3, Vector3};

    #[test]
    fn depth_tracks_outstanding_pushes() {
        let mut pool = Pool::new(10);
        let mut stack: CacheStack<Matrix3> = CacheStack::new();
        for _ in 0..5 {
            stack.push(&mut pool);
        }
        stack.pop(&mut pool);
        stack.pop(&mut pool);
        assert_eq!(stack.depth(), 3);
        stack.clear(&mut pool);
        assert!(stack.is_empty());
        assert_eq!(pool.free_count(), 5);
    }

    #[test]
    fn push_copies_accumulated_value() {
        let mut pool = Pool::new(10);
        let mut stack: CacheStack<Matrix3> = CacheStack::new();
        stack.push(&mut pool);
        assert_eq!(stack.peek(), Some(&Matrix3::identity()));
        stack
            .modify(&Matrix3::create_scale_matrix(2.0, 2.0, 2.0))
            .unwrap();
        stack.push(&mut pool);
        stack
            .modify(&Matrix3::create_translation_matrix(1.0, 0.0))
            .unwrap();

        let expected = Matrix3::of(2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0);
        assert_eq!(stack.peek(), Some(&expected));

        stack.pop(&mut pool);
        assert_eq!(
            stack.peek(),
            Some(&Matrix3::create_scale_matrix(2.0, 2.0, 2.0))
        );
        stack.pop(&mut pool);
    }

    #[test]
    fn vector_stack_accumulates_offsets() {
        let mut pool = Pool::new(4);
        let mut stack: CacheStack<Vector3> = CacheStack::new();
        stack.push(&mut pool);
        stack.modify(&Vector3::of(1.0, 2.0, 3.0)).unwrap();
        stack.push(&mut pool);
        stack.modify(&Vector3::of(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(stack.peek(), Some(&Vector3::of(2.0, 3.0, 4.0)));
        stack.clear(&mut pool);
    }

    #[test]
    fn try_pop_on_empty_stack_is_an_error() {
        let mut pool: Pool<Matrix3> = Pool::new(2);
        let mut stack = CacheStack::new();
        stack.push(&mut pool);
        assert_eq!(stack.try_pop(&mut pool), Ok(()));
        assert_eq!(stack.try_pop(&mut pool), Err(MathError::EmptyStack));
        assert_eq!(
            stack.modify(&Matrix3::identity()),
            Err(MathError::EmptyStack)
        );
    }

    #[test]
    #[should_panic(expected = "empty stack")]
    fn pop_on_empty_stack_panics() {
        let mut pool: Pool<Matrix3> = Pool::new(2);
        let mut stack = CacheStack::new();
        stack.push(&mut pool);
        stack.pop(&mut pool);
        stack.pop(&mut pool);
    }
}
