use nalgebra::Vector3;

/// Number of light slots every lighting shader declares.
pub const MAX_LIGHTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightEntry {
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub attenuation_factor: f32,
}

impl LightEntry {
    pub fn new(position: Vector3<f32>, color: Vector3<f32>, attenuation_factor: f32) -> LightEntry {
        LightEntry { position, color, attenuation_factor }
    }
}

impl Default for LightEntry {
    fn default() -> Self {
        LightEntry {
            position: Vector3::zeros(),
            color: Vector3::zeros(),
            attenuation_factor: 0.0,
        }
    }
}

/// Fixed-capacity light list. The slot index is the light index the shader
/// iterates over, so entries keep insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct LightArray {
    slots: [LightEntry; MAX_LIGHTS],
    len: usize,
}

impl LightArray {
    pub fn new() -> LightArray {
        LightArray {
            slots: [LightEntry::default(); MAX_LIGHTS],
            len: 0,
        }
    }

    /// Appends a light and returns its index, or hands the light back when
    /// all slots are taken.
    pub fn push(self: &mut Self, light: LightEntry) -> Result<usize, LightEntry> {
        if self.len == MAX_LIGHTS {
            return Err(light);
        }

        let index = self.len;
        self.slots[index] = light;
        self.len += 1;
        Ok(index)
    }

    /// Overwrites a slot directly. Slots past `len()` may be written; `len()`
    /// grows to cover them.
    pub fn set(self: &mut Self, index: usize, light: LightEntry) -> bool {
        if index >= MAX_LIGHTS {
            return false;
        }

        self.slots[index] = light;
        self.len = self.len.max(index + 1);
        true
    }

    pub fn get(self: &Self, index: usize) -> Option<&LightEntry> {
        self.slots[..self.len].get(index)
    }

    pub fn get_mut(self: &mut Self, index: usize) -> Option<&mut LightEntry> {
        self.slots[..self.len].get_mut(index)
    }

    /// Forgets the lights without zeroing the slots.
    pub fn clear(self: &mut Self) {
        self.len = 0;
    }

    pub fn len(self: &Self) -> usize {
        self.len
    }

    pub fn is_empty(self: &Self) -> bool {
        self.len == 0
    }

    pub fn iter(self: &Self) -> impl Iterator<Item = &LightEntry> {
        self.slots[..self.len].iter()
    }

    /// Every slot, including unused ones.
    pub fn slots(self: &Self) -> &[LightEntry; MAX_LIGHTS] {
        &self.slots
    }
}

impl Default for LightArray {
    fn default() -> Self {
        LightArray::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(x: f32) -> LightEntry {
        LightEntry::new(Vector3::new(x, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0), 0.1)
    }

    #[test]
    fn push_keeps_insertion_order_until_full() {
        let mut lights = LightArray::new();
        for i in 0..MAX_LIGHTS {
            assert_eq!(lights.push(light(i as f32)), Ok(i));
        }

        assert_eq!(lights.push(light(99.0)), Err(light(99.0)));
        assert_eq!(lights.len(), MAX_LIGHTS);
        assert_eq!(lights.get(3).map(|l| l.position.x), Some(3.0));
    }

    #[test]
    fn set_past_the_end_extends_length() {
        let mut lights = LightArray::new();
        assert!(lights.set(4, light(4.0)));
        assert_eq!(lights.len(), 5);
        assert!(!lights.set(MAX_LIGHTS, light(0.0)));
    }

    #[test]
    fn clear_leaves_slot_contents() {
        let mut lights = LightArray::new();
        lights.push(light(7.0)).unwrap();
        lights.clear();

        assert!(lights.is_empty());
        assert!(lights.get(0).is_none());
        assert_eq!(lights.slots()[0].position.x, 7.0);
    }
}
