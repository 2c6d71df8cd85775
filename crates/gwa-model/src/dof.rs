use serde::{Deserialize, Serialize};

/// One value per degree of freedom: three translations, three rotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dof6<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub xx: T,
    pub yy: T,
    pub zz: T,
}

pub type Restraint = Dof6<bool>;
pub type Stiffness = Dof6<f64>;

impl<T: Copy> Dof6<T> {
    pub fn splat(value: T) -> Self {
        Self::from_array([value; 6])
    }

    pub fn from_array(values: [T; 6]) -> Self {
        let [x, y, z, xx, yy, zz] = values;
        Self {
            x,
            y,
            z,
            xx,
            yy,
            zz,
        }
    }

    pub fn to_array(self) -> [T; 6] {
        [self.x, self.y, self.z, self.xx, self.yy, self.zz]
    }

    pub fn zip_with(self, other: Self, f: impl Fn(T, T) -> T) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        Self::from_array(std::array::from_fn(|i| f(a[i], b[i])))
    }
}

impl Dof6<bool> {
    pub fn any(self) -> bool {
        self.to_array().into_iter().any(|v| v)
    }

    /// Logical OR per component.
    pub fn union(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a || b)
    }
}

impl Dof6<f64> {
    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        self.zip_with(other, f64::max)
    }

    pub fn is_zero(self) -> bool {
        self.to_array().into_iter().all(|v| v == 0.0)
    }
}
