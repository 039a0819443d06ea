//! Dimension kinds
//!
//! Zero-sized type tags that let `Quantity<Length>` and `Quantity<Time>` be
//! told apart at compile time. Each kind names the run-time `Dimension` it
//! stands for; `AnyKind` stands for none in particular and defers the check
//! to run time.
//!
//! ```
//! use quanta_units::kind::{Kind, Length, Quotient, Time};
//! use quanta_units::Dimension;
//!
//! assert_eq!(<Quotient<Length, Time>>::DIMENSION, Some(Dimension::VELOCITY));
//! ```

use crate::Dimension;
use std::marker::PhantomData;

/// Marker trait for dimension kinds.
pub trait Kind: 'static {
    /// The dimension every quantity of this kind has; `None` for `AnyKind`.
    const DIMENSION: Option<Dimension>;

    /// Whether a value of dimension `dim` may carry this kind.
    fn admits(dim: Dimension) -> bool {
        match Self::DIMENSION {
            Some(expected) => expected == dim,
            None => true,
        }
    }
}

macro_rules! base_kinds {
    ($($(#[$meta:meta])* $name:ident => $dim:expr;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $name {}

            impl Kind for $name {
                const DIMENSION: Option<Dimension> = Some($dim);
            }
        )*
    };
}

base_kinds! {
    Length => Dimension::LENGTH;
    Mass => Dimension::MASS;
    Time => Dimension::TIME;
    ElectricCurrent => Dimension::CURRENT;
    Temperature => Dimension::TEMPERATURE;
    AmountOfSubstance => Dimension::AMOUNT;
    LuminousIntensity => Dimension::LUMINOSITY;
    /// Pure numbers, ratios and counts
    Dimensionless => Dimension::NONE;
    Area => Dimension::AREA;
    Volume => Dimension::VOLUME;
    Speed => Dimension::VELOCITY;
    Acceleration => Dimension::ACCELERATION;
    Force => Dimension::FORCE;
    Energy => Dimension::ENERGY;
    Power => Dimension::POWER;
    Pressure => Dimension::PRESSURE;
    Frequency => Dimension::FREQUENCY;
}

/// Kind of a quantity whose dimension is only known at run time.
#[derive(Debug)]
pub enum AnyKind {}

impl Kind for AnyKind {
    const DIMENSION: Option<Dimension> = None;
}

/// Kind of the product of an `A` and a `B`.
#[derive(Debug)]
pub struct Product<A, B>(PhantomData<fn() -> (A, B)>);

impl<A: Kind, B: Kind> Kind for Product<A, B> {
    const DIMENSION: Option<Dimension> = match (A::DIMENSION, B::DIMENSION) {
        (Some(a), Some(b)) => Some(a.multiply(b)),
        _ => None,
    };
}

/// Kind of the reciprocal of an `A`.
#[derive(Debug)]
pub struct Inverse<A>(PhantomData<fn() -> A>);

impl<A: Kind> Kind for Inverse<A> {
    const DIMENSION: Option<Dimension> = match A::DIMENSION {
        Some(a) => Some(a.invert()),
        None => None,
    };
}

/// Kind of an `A` divided by a `B`.
pub type Quotient<A, B> = Product<A, Inverse<B>>;
