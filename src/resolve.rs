//! Turning materialized query output into plain values of one variable

use crate::prelude::*;
use crate::VALID_POINT_MASK;

use tracing::subscriber::NoSubscriber;

const COORDINATES: [&str; 3] = ["X", "Y", "Z"];
const COMPONENT_SUFFIXES: [&str; 3] = [" X", " Y", " Z"];

#[derive(Debug, Clone, Copy, Default)]
/// Reads the values of a variable out of the point data of a [`SampledData`].
///
/// A variable name is resolved against, in this order:
///
/// 1. the name of a point array. Scalar arrays give their values and three
///    component arrays the magnitude of each vector. Arrays with any other
///    number of components have no single value per sample and resolve to
///    `None` under their own name
/// 2. `X`, `Y` or `Z`, the coordinates of the samples
/// 3. the name of a point array followed by ` X`, ` Y` or ` Z`, one component
///    of that array
///
/// Anything else resolves to `None`. When invalid samples are skipped only the
/// samples flagged by the [`VALID_POINT_MASK`] array are kept; without that
/// array nothing is skipped.
pub struct FieldResolver;

impl FieldResolver {
    /// run `query` on `dataset`. Whatever the engine logs while it works is
    /// discarded, the caller's subscriber is back in place once this returns or
    /// unwinds.
    pub fn materialize<E: Engine>(engine: &E, dataset: &E::Dataset, query: &Query) -> Result<SampledData, Error> {
        tracing::subscriber::with_default(NoSubscriber::default(), || engine.execute(dataset, query))
    }

    /// materialize `query` and resolve `variable` in its output
    pub fn sample<E: Engine>(
        engine: &E,
        dataset: &E::Dataset,
        query: &Query,
        variable: &str,
        skip_invalid: bool,
    ) -> Result<Option<Vec<f64>>, Error> {
        let data = Self::materialize(engine, dataset, query)?;
        Ok(Self::resolve(&data, variable, skip_invalid))
    }

    pub fn resolve(data: &SampledData, variable: &str, skip_invalid: bool) -> Option<Vec<f64>> {
        let values = select(data, variable)?;

        let mask = data
            .point_data
            .get(VALID_POINT_MASK)
            .filter(|_| skip_invalid);

        let keep = |row: usize| match mask {
            Some(mask) => mask.values.get([row, 0]) == Some(&1.0),
            None => true,
        };

        let out: Vec<f64> = values
            .iter()
            .enumerate()
            .filter(|(row, _)| keep(*row))
            .map(|(_, value)| *value)
            .collect();

        tracing::trace!(variable, values = out.len(), "resolved variable");

        Some(out)
    }
}

/// one value per sample for a variable name
fn select(data: &SampledData, variable: &str) -> Option<Array1<f64>> {
    if let Some(array) = data.point_data.get(variable) {
        return match array.components() {
            1 => Some(column(&array.values, 0)),
            3 => Some(array.values.map_axis(ndarray::Axis(1), |v| v.dot(&v).sqrt())),
            components => {
                tracing::debug!(variable, components, "array is neither scalar nor vector");
                None
            }
        };
    }

    if let Some(axis) = COORDINATES.iter().position(|c| *c == variable) {
        return Some(column(&data.points, axis));
    }

    COMPONENT_SUFFIXES.iter().enumerate().find_map(|(axis, suffix)| {
        let name = variable.strip_suffix(suffix)?;
        let array = data.point_data.get(name)?;
        (axis < array.components()).then(|| column(&array.values, axis))
    })
}

fn column(values: &Array2<f64>, index: usize) -> Array1<f64> {
    values.column(index).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_output(mask: Option<Vec<f64>>) -> SampledData {
        let points = ndarray::arr2(&[[0.0, 0.5, 0.5], [1.0, 0.5, 0.5], [5.0, 0.5, 0.5]]);

        let mut point_data = Attributes::new();
        point_data.insert(DataArray::scalars("p", vec![10.0, 20.0, f64::NAN]));
        point_data.insert(DataArray::vectors(
            "u",
            &[[3.0, 4.0, 0.0], [0.0, 0.0, 2.0], [f64::NAN; 3]],
        ));
        point_data.insert(DataArray::new(
            "uv".into(),
            ndarray::arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
        ));
        if let Some(mask) = mask {
            point_data.insert(DataArray::scalars(VALID_POINT_MASK, mask));
        }

        SampledData::new(points, point_data)
    }

    #[test]
    fn vectors_resolve_to_magnitude() {
        let data = probe_output(Some(vec![1.0, 1.0, 0.0]));
        assert_eq!(FieldResolver::resolve(&data, "u", true), Some(vec![5.0, 2.0]));
        assert_eq!(FieldResolver::resolve(&data, "u X", true), Some(vec![3.0, 0.0]));
        assert_eq!(FieldResolver::resolve(&data, "u Z", true), Some(vec![0.0, 2.0]));
    }

    #[test]
    fn coordinates_and_unknown_names() {
        let data = probe_output(Some(vec![1.0, 1.0, 0.0]));
        assert_eq!(FieldResolver::resolve(&data, "X", true), Some(vec![0.0, 1.0]));
        assert_eq!(FieldResolver::resolve(&data, "Y", true), Some(vec![0.5, 0.5]));
        assert_eq!(FieldResolver::resolve(&data, "x", true), None);
        assert_eq!(FieldResolver::resolve(&data, "missing", true), None);
        assert_eq!(FieldResolver::resolve(&data, "missing X", true), None);
    }

    #[test]
    fn point_array_shadows_coordinate() {
        let mut data = probe_output(None);
        data.point_data.insert(DataArray::scalars("X", vec![-1.0, -2.0, -3.0]));
        assert_eq!(FieldResolver::resolve(&data, "X", true), Some(vec![-1.0, -2.0, -3.0]));
    }

    #[test]
    fn component_beyond_array_is_absent() {
        let data = probe_output(None);
        assert_eq!(FieldResolver::resolve(&data, "uv Y", false), Some(vec![2.0, 4.0, 6.0]));
        assert_eq!(FieldResolver::resolve(&data, "uv Z", false), None);
        assert_eq!(FieldResolver::resolve(&data, "p Y", false), None);
    }

    #[test]
    fn two_component_array_has_no_value_per_sample() {
        let data = probe_output(Some(vec![0.0, 1.0, 1.0]));
        assert_eq!(FieldResolver::resolve(&data, "uv", true), None);
        assert_eq!(FieldResolver::resolve(&data, "uv", false), None);

        // its components still line up with the samples
        assert_eq!(FieldResolver::resolve(&data, "uv X", true), Some(vec![3.0, 5.0]));
        assert_eq!(FieldResolver::resolve(&data, "uv X", false).map(|v| v.len()), Some(3));
    }

    #[test]
    fn filtering_keeps_or_drops_invalid_samples() {
        let data = probe_output(Some(vec![1.0, 1.0, 0.0]));

        let kept = FieldResolver::resolve(&data, "p", false).unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept[2].is_nan());

        assert_eq!(FieldResolver::resolve(&data, "p", true), Some(vec![10.0, 20.0]));
    }

    #[test]
    fn filtering_without_mask_is_a_noop() {
        let data = probe_output(None);
        assert_eq!(FieldResolver::resolve(&data, "X", true), Some(vec![0.0, 1.0, 5.0]));
    }

    #[test]
    fn nothing_valid_is_empty_not_absent() {
        let data = probe_output(Some(vec![0.0, 0.0, 0.0]));
        assert_eq!(FieldResolver::resolve(&data, "p", true), Some(vec![]));
    }

    #[test]
    fn materialize_silences_the_engine() {
        use crate::source::Format;
        use std::cell::Cell;
        use std::path::Path;

        struct Chatty {
            silenced: Cell<bool>,
        }

        impl Engine for Chatty {
            type Dataset = ();

            fn open(&self, _: &Path, _: Format) -> Result<(), Error> {
                Ok(())
            }

            fn arrays(&self, _: &(), _: Location) -> Vec<String> {
                Vec::new()
            }

            fn execute(&self, _: &(), _: &Query) -> Result<SampledData, Error> {
                tracing::warn!("use append poly data filter");
                let silenced = tracing::dispatcher::get_default(|d| d.is::<NoSubscriber>());
                self.silenced.set(silenced);
                Ok(SampledData::new(Array2::zeros((0, 3)), Attributes::new()))
            }

            fn release(&self, _: ()) {}
        }

        let engine = Chatty {
            silenced: Cell::new(false),
        };
        let query = Query::Probe { center: Point3::origin() };

        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            FieldResolver::materialize(&engine, &(), &query).unwrap();
            assert!(engine.silenced.get());
            assert!(!tracing::dispatcher::get_default(|d| d.is::<NoSubscriber>()));
        });
    }
}
