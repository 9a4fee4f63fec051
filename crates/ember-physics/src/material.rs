//! Physical material table.

/// Slots in a [`MaterialTable`].
pub const PHYS_MAX_MATERIALS: usize = 256;

/// Built-in material ids.
pub mod material_ids {
    pub const DEFAULT: u8 = 0;
    pub const STATIC: u8 = 1;
    pub const BOUNCY: u8 = 2;
    pub const ICE: u8 = 3;
}

/// Surface response of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysMaterial {
    /// Mass multiplier.
    pub density: f32,
    /// 0.0 (ice) to 1.0 (sandpaper).
    pub friction: f32,
    /// 0.0 (mud) to 1.0 (superball).
    pub restitution: f32,
}

impl PhysMaterial {
    pub const fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
        }
    }
}

impl Default for PhysMaterial {
    fn default() -> Self {
        Self::new(1.0, 0.5, 0.2)
    }
}

/// Materials indexed by `material_id`.
#[derive(Clone, Debug)]
pub struct MaterialTable {
    materials: Box<[PhysMaterial; PHYS_MAX_MATERIALS]>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialTable {
    /// Table with the built-ins registered and every other slot at the default.
    pub fn new() -> Self {
        let mut materials = Box::new([PhysMaterial::default(); PHYS_MAX_MATERIALS]);
        materials[material_ids::STATIC as usize] = PhysMaterial::new(0.0, 1.0, 0.0);
        materials[material_ids::BOUNCY as usize] = PhysMaterial::new(1.0, 0.2, 0.9);
        materials[material_ids::ICE as usize] = PhysMaterial::new(1.0, 0.02, 0.1);
        Self { materials }
    }

    #[inline]
    pub fn get(&self, id: u8) -> &PhysMaterial {
        &self.materials[id as usize]
    }

    pub fn set(&mut self, id: u8, material: PhysMaterial) {
        self.materials[id as usize] = material;
    }

    /// Restitution of a contact between two materials: the livelier one wins.
    pub fn combined_restitution(&self, a: u8, b: u8) -> f32 {
        self.get(a).restitution.max(self.get(b).restitution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let table = MaterialTable::new();
        assert_eq!(table.get(material_ids::DEFAULT), &PhysMaterial::default());
        assert!(table.get(material_ids::BOUNCY).restitution > 0.8);
        assert!(table.get(material_ids::ICE).friction < 0.1);
        assert_eq!(table.get(255), &PhysMaterial::default());
    }

    #[test]
    fn test_combined_restitution_takes_max() {
        let mut table = MaterialTable::new();
        table.set(10, PhysMaterial::new(1.0, 0.5, 0.6));
        assert_eq!(table.combined_restitution(10, material_ids::STATIC), 0.6);
        assert_eq!(
            table.combined_restitution(material_ids::BOUNCY, 10),
            table.get(material_ids::BOUNCY).restitution
        );
    }
}
