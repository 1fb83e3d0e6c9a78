//! Resource upload helpers
//!
//! Immutable geometry goes through [`create_buffer_init`]. Per-frame data
//! lives in a [`TypedBuffer`], which keeps a CPU shadow of its contents and
//! hands out a scoped [`MappedView`]. Whatever is written through the view
//! is copied to the GPU buffer when the view is dropped.

use bytemuck::{Pod, Zeroable};
use std::ops::{Deref, DerefMut};
use wgpu::util::DeviceExt;

/// Create a GPU buffer initialized with `contents`
pub fn create_buffer_init<T: Pod>(
    device: &wgpu::Device,
    label: &str,
    usage: wgpu::BufferUsages,
    contents: &[T],
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(contents),
        usage,
    })
}

/// Destination of a view's bytes when it goes out of scope
pub trait UploadSink {
    fn upload(&self, offset: wgpu::BufferAddress, bytes: &[u8]);
}

/// Uploads through the queue's staging belt; the copy is ordered before the
/// next submission.
pub struct QueueUpload<'a> {
    pub queue: &'a wgpu::Queue,
    pub buffer: &'a wgpu::Buffer,
}

impl UploadSink for QueueUpload<'_> {
    fn upload(&self, offset: wgpu::BufferAddress, bytes: &[u8]) {
        self.queue.write_buffer(self.buffer, offset, bytes);
    }
}

/// Typed write access to a buffer's contents, flushed on drop
pub struct MappedView<'a, T: Pod, S: UploadSink> {
    data: &'a mut [T],
    sink: S,
}

impl<'a, T: Pod, S: UploadSink> MappedView<'a, T, S> {
    pub fn new(data: &'a mut [T], sink: S) -> Self {
        Self { data, sink }
    }
}

impl<T: Pod, S: UploadSink> Deref for MappedView<'_, T, S> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.data
    }
}

impl<T: Pod, S: UploadSink> DerefMut for MappedView<'_, T, S> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.data
    }
}

impl<T: Pod, S: UploadSink> Drop for MappedView<'_, T, S> {
    fn drop(&mut self) {
        self.sink.upload(0, bytemuck::cast_slice(self.data));
    }
}

/// Fixed-capacity GPU buffer of `T` with a CPU shadow copy
pub struct TypedBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    shadow: Vec<T>,
}

impl<T: Pod + Zeroable> TypedBuffer<T> {
    /// A buffer of `capacity` zeroed elements. `COPY_DST` is always added.
    pub fn new(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages, capacity: usize) -> Self {
        Self::with_contents(device, label, usage, vec![T::zeroed(); capacity.max(1)])
    }

    pub fn with_contents(
        device: &wgpu::Device,
        label: &str,
        usage: wgpu::BufferUsages,
        contents: Vec<T>,
    ) -> Self {
        let buffer = create_buffer_init(device, label, usage | wgpu::BufferUsages::COPY_DST, &contents);
        Self {
            buffer,
            shadow: contents,
        }
    }

    /// Uniform buffer holding a single value
    pub fn uniform(device: &wgpu::Device, label: &str, value: T) -> Self {
        Self::with_contents(device, label, wgpu::BufferUsages::UNIFORM, vec![value])
    }

    pub fn capacity(&self) -> usize {
        self.shadow.len()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Last contents written through a view
    pub fn contents(&self) -> &[T] {
        &self.shadow
    }

    /// Scoped write access; the GPU copy is updated when the view drops
    pub fn map_write<'a>(&'a mut self, queue: &'a wgpu::Queue) -> MappedView<'a, T, QueueUpload<'a>> {
        MappedView::new(
            &mut self.shadow,
            QueueUpload {
                queue,
                buffer: &self.buffer,
            },
        )
    }

    /// Overwrite the first element, for single-value uniforms
    pub fn write(&mut self, queue: &wgpu::Queue, value: T) {
        self.map_write(queue)[0] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        uploads: RefCell<Vec<(u64, Vec<u8>)>>,
    }

    impl UploadSink for &Recorder {
        fn upload(&self, offset: wgpu::BufferAddress, bytes: &[u8]) {
            self.uploads.borrow_mut().push((offset, bytes.to_vec()));
        }
    }

    #[test]
    fn view_flushes_once_on_drop() {
        let recorder = Recorder::default();
        let mut data = [0u32; 4];
        {
            let mut view = MappedView::new(&mut data, &recorder);
            view[1] = 7;
            view[3] = 9;
            assert!(recorder.uploads.borrow().is_empty());
        }
        let uploads = recorder.uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, 0);
        assert_eq!(uploads[0].1, bytemuck::cast_slice::<u32, u8>(&[0, 7, 0, 9]));
        assert_eq!(data, [0, 7, 0, 9]);
    }

    #[test]
    fn untouched_elements_keep_previous_values() {
        let recorder = Recorder::default();
        let mut data = [1.0f32, 2.0, 3.0];
        {
            let mut view = MappedView::new(&mut data, &recorder);
            view[0] = 5.0;
        }
        assert_eq!(data, [5.0, 2.0, 3.0]);
    }
}
