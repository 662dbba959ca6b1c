//! Cursor-based reads and writes of fixed-width values in network byte order
//!
//! Both cursors work over a buffer whose length is fixed up front. Failures are
//! soft: a read past the end yields the zero value, a write that does not fit
//! returns `false`. In both cases the cursor stays where it was, so a caller
//! can keep going after a malformed packet instead of unwinding.

/// A fixed-width value with a big-endian wire representation
pub trait WireValue: Copy + Default {
    /// Number of bytes the value occupies on the wire
    const SIZE: usize;

    /// Writes the big-endian bytes into `dst`, which is exactly `SIZE` long
    fn put_be(self, dst: &mut [u8]);

    /// Reads from `src`, which is exactly `SIZE` long
    fn get_be(src: &[u8]) -> Self;
}

macro_rules! impl_wire_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn put_be(self, dst: &mut [u8]) {
                    dst.copy_from_slice(&self.to_be_bytes());
                }

                fn get_be(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_value!(u8, i8, u16, i16, u32, i32, u64, i64);

// Floats travel as their IEEE-754 bit pattern so the round trip is bit-exact.
impl WireValue for f32 {
    const SIZE: usize = 4;

    fn put_be(self, dst: &mut [u8]) {
        self.to_bits().put_be(dst);
    }

    fn get_be(src: &[u8]) -> Self {
        f32::from_bits(u32::get_be(src))
    }
}

/// Reads values out of an inbound packet
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Starts reading at `offset`. An offset past the end is allowed; every
    /// read from it will soft-fail.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            position: offset,
        }
    }

    /// Reads the next value, or returns the zero value if fewer than
    /// `T::SIZE` bytes remain. The cursor only moves on success.
    pub fn read<T: WireValue>(&mut self) -> T {
        self.try_read().unwrap_or_default()
    }

    /// Like [`read`](Self::read) but tells a short buffer apart from a zero.
    pub fn try_read<T: WireValue>(&mut self) -> Option<T> {
        let end = self.position.checked_add(T::SIZE)?;
        if end > self.data.len() {
            return None;
        }

        let value = T::get_be(&self.data[self.position..end]);
        self.position = end;
        Some(value)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Writes values into a fixed-length outbound buffer
#[derive(Debug)]
pub struct PacketWriter<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> PacketWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self::at(data, 0)
    }

    pub fn at(data: &'a mut [u8], offset: usize) -> Self {
        Self {
            data,
            position: offset,
        }
    }

    /// Appends `value` at the cursor. Returns `false` and leaves the buffer
    /// untouched if it would not fit.
    pub fn write<T: WireValue>(&mut self, value: T) -> bool {
        let end = match self.position.checked_add(T::SIZE) {
            Some(end) if end <= self.data.len() => end,
            _ => return false,
        };

        value.put_be(&mut self.data[self.position..end]);
        self.position = end;
        true
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
