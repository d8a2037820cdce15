#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Binary quadratic models.
//!
//! A [`BinaryQuadraticModel`] is an energy function over two-valued decision
//! variables, defined by per-variable linear biases, per-pair quadratic
//! biases and a constant offset. The variables take values in `{0, 1}`
//! ([`Vartype::Binary`]) or `{-1, +1}` ([`Vartype::Spin`]). Minimizing the
//! energy yields the assignment the model was built to prefer.
//!
//! Models are assembled by merging sub-models with [`BinaryQuadraticModel::update`]
//! and shrunk by substituting known values with
//! [`BinaryQuadraticModel::fix_variable`]; after that they are handed off
//! unchanged to whatever performs the minimization.

use rustc_hash::FxHashMap;
use std::fmt::{self, Display};
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// The two-valued domain of a model's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Vartype {
    /// Variables take values in `{0, 1}`.
    Binary,
    /// Variables take values in `{-1, +1}`.
    #[default]
    Spin,
}

impl Vartype {
    /// The value representing "selected" in this domain.
    #[must_use]
    pub const fn active_value(self) -> i8 {
        1
    }

    /// The value representing "not selected" in this domain.
    #[must_use]
    pub const fn inactive_value(self) -> i8 {
        match self {
            Self::Binary => 0,
            Self::Spin => -1,
        }
    }
}

impl Display for Vartype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Spin => write!(f, "spin"),
        }
    }
}

/// Error returned when parsing a [`Vartype`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown vartype `{0}`, expected `binary` or `spin`")]
pub struct ParseVartypeError(String);

impl FromStr for Vartype {
    type Err = ParseVartypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "qubo" => Ok(Self::Binary),
            "spin" | "ising" => Ok(Self::Spin),
            _ => Err(ParseVartypeError(s.to_string())),
        }
    }
}

/// A quadratic energy function over two-valued variables.
///
/// Generic over the variable identifier `V`, in the same way the rest of the
/// crate keys everything on cheap `Copy` identifiers. Quadratic biases are
/// stored once per unordered pair, keyed by the `Ord`-canonical `(min, max)`
/// tuple; adding a bias for a pair that already has one sums the two.
/// Every variable mentioned by a quadratic term also has a linear entry,
/// created as zero on demand.
#[derive(Debug, Clone)]
pub struct BinaryQuadraticModel<V> {
    linear: FxHashMap<V, f64>,
    quadratic: FxHashMap<(V, V), f64>,
    offset: f64,
    vartype: Vartype,
}

impl<V: Eq + Hash> PartialEq for BinaryQuadraticModel<V> {
    fn eq(&self, other: &Self) -> bool {
        self.linear == other.linear
            && self.quadratic == other.quadratic
            && self.offset == other.offset
            && self.vartype == other.vartype
    }
}

impl<V: Copy + Eq + Hash + Ord> BinaryQuadraticModel<V> {
    /// Creates an empty model (no variables, offset zero) over `vartype`.
    #[must_use]
    pub fn new(vartype: Vartype) -> Self {
        Self {
            linear: FxHashMap::default(),
            quadratic: FxHashMap::default(),
            offset: 0.0,
            vartype,
        }
    }

    /// The domain the variables take their values from.
    #[must_use]
    pub const fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// The constant energy offset.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Number of variables in the model.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    /// Number of quadratic interactions in the model.
    #[must_use]
    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    /// Whether `v` is a variable of this model.
    #[must_use]
    pub fn contains_variable(&self, v: &V) -> bool {
        self.linear.contains_key(v)
    }

    /// Iterates over the model's variables in arbitrary order.
    pub fn variables(&self) -> impl Iterator<Item = V> + '_ {
        self.linear.keys().copied()
    }

    /// The linear bias of `v`, zero if absent.
    #[must_use]
    pub fn linear(&self, v: V) -> f64 {
        self.linear.get(&v).copied().unwrap_or(0.0)
    }

    /// The quadratic bias of the unordered pair `{u, v}`, zero if absent.
    #[must_use]
    pub fn quadratic(&self, u: V, v: V) -> f64 {
        self.quadratic.get(&ordered(u, v)).copied().unwrap_or(0.0)
    }

    /// Iterates over `(variable, linear bias)` entries in arbitrary order.
    pub fn linear_iter(&self) -> impl Iterator<Item = (V, f64)> + '_ {
        self.linear.iter().map(|(&v, &bias)| (v, bias))
    }

    /// Iterates over `(u, v, quadratic bias)` entries in arbitrary order,
    /// with `u < v`.
    pub fn quadratic_iter(&self) -> impl Iterator<Item = (V, V, f64)> + '_ {
        self.quadratic.iter().map(|(&(u, v), &bias)| (u, v, bias))
    }

    /// Ensures `v` is a variable of the model, with a zero bias if new.
    pub fn add_variable(&mut self, v: V) {
        self.linear.entry(v).or_insert(0.0);
    }

    /// Adds `bias` to the linear bias of `v`, inserting it if absent.
    pub fn add_linear(&mut self, v: V, bias: f64) {
        *self.linear.entry(v).or_insert(0.0) += bias;
    }

    /// Adds `bias` to the quadratic bias of the unordered pair `{u, v}`,
    /// inserting the pair (and zero linear entries for its endpoints) if
    /// absent.
    ///
    /// # Panics
    ///
    /// If `u == v`; self-interactions have no meaning for two-valued
    /// variables (`x² = x` and `s² = 1`) and always indicate a caller bug.
    pub fn add_quadratic(&mut self, u: V, v: V, bias: f64) {
        assert!(u != v, "self-interaction added to a quadratic model");
        self.add_variable(u);
        self.add_variable(v);
        *self.quadratic.entry(ordered(u, v)).or_insert(0.0) += bias;
    }

    /// Adds `delta` to the constant offset.
    pub fn add_offset(&mut self, delta: f64) {
        self.offset += delta;
    }

    /// Merges `other` into `self`, summing offsets and biases coefficient
    /// by coefficient. Missing entries are created as zero before adding,
    /// so merging is commutative and associative. If the vartypes differ,
    /// `other` is converted to this model's vartype first.
    pub fn update(&mut self, mut other: Self) {
        other.change_vartype(self.vartype);
        self.offset += other.offset;
        for (v, bias) in other.linear {
            self.add_linear(v, bias);
        }
        for ((u, v), bias) in other.quadratic {
            self.add_quadratic(u, v, bias);
        }
    }

    /// Removes `v` from the model by substituting `value` for it wherever
    /// it appears: its linear contribution folds into the offset and its
    /// quadratic contributions fold into the linear biases of the paired
    /// variables.
    ///
    /// Fixing is irreversible and confluent: the final model does not
    /// depend on the order in which variables are fixed, and its minimum
    /// over the remaining variables equals the original minimum restricted
    /// to assignments consistent with the fixed values.
    ///
    /// # Panics
    ///
    /// If `v` is not a variable of the model.
    pub fn fix_variable(&mut self, v: V, value: i8) {
        let val = f64::from(value);
        let bias = self
            .linear
            .remove(&v)
            .expect("fixed a variable that is not in the model");
        self.offset += bias * val;

        let mut retained =
            FxHashMap::with_capacity_and_hasher(self.quadratic.len(), rustc_hash::FxBuildHasher);
        for ((a, b), q) in self.quadratic.drain() {
            if a == v {
                *self.linear.get_mut(&b).expect("pair endpoint has a linear entry") += q * val;
            } else if b == v {
                *self.linear.get_mut(&a).expect("pair endpoint has a linear entry") += q * val;
            } else {
                retained.insert((a, b), q);
            }
        }
        self.quadratic = retained;
    }

    /// Fixes several variables; see [`Self::fix_variable`].
    pub fn fix_variables<I>(&mut self, fixes: I)
    where
        I: IntoIterator<Item = (V, i8)>,
    {
        for (v, value) in fixes {
            self.fix_variable(v, value);
        }
    }

    /// The energy of a complete assignment.
    ///
    /// # Panics
    ///
    /// If `sample` does not assign every variable of the model.
    #[must_use]
    pub fn energy(&self, sample: &FxHashMap<V, i8>) -> f64 {
        let mut energy = self.offset;
        for (&v, &bias) in &self.linear {
            energy += bias * f64::from(sample[&v]);
        }
        for (&(u, v), &bias) in &self.quadratic {
            energy += bias * f64::from(sample[&u]) * f64::from(sample[&v]);
        }
        energy
    }

    /// Rewrites the model over the other domain via the exact affine
    /// substitution `x = (s + 1) / 2` (or its inverse `s = 2x - 1`),
    /// preserving the energy of every assignment under that mapping.
    /// A no-op when the model already has the requested vartype.
    pub fn change_vartype(&mut self, vartype: Vartype) {
        if self.vartype == vartype {
            return;
        }

        let mut linear: FxHashMap<V, f64> =
            FxHashMap::with_capacity_and_hasher(self.linear.len(), rustc_hash::FxBuildHasher);
        let mut quadratic: FxHashMap<(V, V), f64> =
            FxHashMap::with_capacity_and_hasher(self.quadratic.len(), rustc_hash::FxBuildHasher);
        let mut offset = self.offset;

        match vartype {
            Vartype::Spin => {
                // x = (s + 1) / 2
                for (&v, &l) in &self.linear {
                    linear.insert(v, l / 2.0);
                    offset += l / 2.0;
                }
                for (&(u, v), &q) in &self.quadratic {
                    quadratic.insert((u, v), q / 4.0);
                    *linear.get_mut(&u).expect("pair endpoint has a linear entry") += q / 4.0;
                    *linear.get_mut(&v).expect("pair endpoint has a linear entry") += q / 4.0;
                    offset += q / 4.0;
                }
            }
            Vartype::Binary => {
                // s = 2x - 1
                for (&v, &l) in &self.linear {
                    linear.insert(v, 2.0 * l);
                    offset -= l;
                }
                for (&(u, v), &q) in &self.quadratic {
                    quadratic.insert((u, v), 4.0 * q);
                    *linear.get_mut(&u).expect("pair endpoint has a linear entry") -= 2.0 * q;
                    *linear.get_mut(&v).expect("pair endpoint has a linear entry") -= 2.0 * q;
                    offset += q;
                }
            }
        }

        self.linear = linear;
        self.quadratic = quadratic;
        self.offset = offset;
        self.vartype = vartype;
    }
}

impl<V: Copy + Eq + Hash + Ord + Display> BinaryQuadraticModel<V> {
    /// Renders the model in a line-oriented COO text form suitable for
    /// handing to an external solver process: header comments carrying the
    /// vartype and offset, then `v v bias` lines for linear biases and
    /// `u v bias` lines for quadratic biases, both sorted for
    /// reproducibility.
    #[must_use]
    pub fn to_coo(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# vartype={}\n", self.vartype));
        out.push_str(&format!("# offset={}\n", self.offset));

        let mut linear: Vec<(V, f64)> = self.linear_iter().collect();
        linear.sort_by(|a, b| a.0.cmp(&b.0));
        for (v, bias) in linear {
            out.push_str(&format!("{v} {v} {bias}\n"));
        }

        let mut quadratic: Vec<(V, V, f64)> = self.quadratic_iter().collect();
        quadratic.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        for (u, v, bias) in quadratic {
            out.push_str(&format!("{u} {v} {bias}\n"));
        }

        out
    }
}

impl<V> Display for BinaryQuadraticModel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BinaryQuadraticModel({} variables, {} interactions, offset {}, {})",
            self.linear.len(),
            self.quadratic.len(),
            self.offset,
            self.vartype
        )
    }
}

fn ordered<V: Ord>(u: V, v: V) -> (V, V) {
    if u <= v { (u, v) } else { (v, u) }
}
