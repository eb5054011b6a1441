use crate::error::{EngineError, Result};
use crate::genotype::GenotypeEncoder;
use crate::observation::Observation;
use crate::panel::MarkerPanel;

/// Ordinal-encoded genotypes laid out in marker-panel order.
///
/// Built fresh for every prediction and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    /// Encodes the observation's genotype for each panel marker, in panel order.
    ///
    /// Markers absent from the observation take the encoder's default ordinal,
    /// so the result always has `panel.len()` entries.
    pub fn build(
        panel: &MarkerPanel,
        observation: &Observation,
        encoder: &GenotypeEncoder,
    ) -> Result<Self> {
        panel
            .iter()
            .map(|marker| encoder.encode_marker(marker, observation.get(marker)))
            .collect::<Result<Vec<_>>>()
            .map(FeatureVector)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for FeatureVector {
    fn from(values: Vec<u8>) -> Self {
        FeatureVector(values)
    }
}

/// Row-major training matrix where every row has the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMatrix {
    n_features: usize,
    rows: Vec<Vec<u8>>,
}

impl FeatureMatrix {
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(n_features: usize, rows: Vec<Vec<u8>>) -> Result<Self> {
        let mut matrix = Self::new(n_features);
        for row in rows {
            matrix.push(row)?;
        }
        Ok(matrix)
    }

    pub fn push(&mut self, row: impl Into<Vec<u8>>) -> Result<()> {
        let row = row.into();
        if row.len() != self.n_features {
            return Err(EngineError::ShapeMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[u8] {
        &self.rows[index]
    }

    /// Copies the selected rows, in the order given, into a new matrix.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            n_features: self.n_features,
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

impl From<FeatureVector> for Vec<u8> {
    fn from(vector: FeatureVector) -> Self {
        vector.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::UnrecognizedPolicy;
    use crate::types::TraitKind;

    #[test]
    fn test_vector_follows_panel_order() {
        let panel = MarkerPanel::for_trait(TraitKind::EyeColor);
        let obs: Observation = [
            ("rs12913832", "AG"),
            ("rs1800407", "GG"),
            ("rs12896399", "GG"),
            ("rs16891982", "GG"),
            ("rs1393350", "AA"),
            ("rs12203592", "GG"),
        ]
        .into_iter()
        .collect();

        let fv = FeatureVector::build(&panel, &obs, &GenotypeEncoder::new()).unwrap();
        assert_eq!(fv.as_slice(), &[1, 2, 2, 2, 0, 2]);
    }

    #[test]
    fn test_length_is_panel_length_for_any_observation() {
        let encoder = GenotypeEncoder::new().with_default_value(1).unwrap();
        for kind in TraitKind::ALL {
            let panel = MarkerPanel::for_trait(kind);

            let empty = FeatureVector::build(&panel, &Observation::new(), &encoder).unwrap();
            assert_eq!(empty.len(), panel.len());
            assert!(empty.as_slice().iter().all(|&v| v == 1));

            let unrelated: Observation = [("rs0000001", "AA"), ("rs0000002", "CT")]
                .into_iter()
                .collect();
            let partial = FeatureVector::build(&panel, &unrelated, &encoder).unwrap();
            assert_eq!(partial.len(), panel.len());
        }
    }

    #[test]
    fn test_reject_policy_fails_the_vector() {
        let panel = MarkerPanel::for_trait(TraitKind::HairColor);
        let obs: Observation = [("rs1805007", "??")].into_iter().collect();
        let encoder = GenotypeEncoder::new().with_policy(UnrecognizedPolicy::Reject);
        assert!(matches!(
            FeatureVector::build(&panel, &obs, &encoder),
            Err(EngineError::UnrecognizedGenotype { .. })
        ));
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let mut matrix = FeatureMatrix::new(3);
        matrix.push(vec![0, 1, 2]).unwrap();
        let err = matrix.push(vec![0, 1]).unwrap_err();
        assert_eq!(err, EngineError::ShapeMismatch { expected: 3, actual: 2 });
        assert_eq!(matrix.n_rows(), 1);
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let matrix = FeatureMatrix::from_rows(1, vec![vec![0], vec![1], vec![2]]).unwrap();
        let picked = matrix.select(&[2, 0]);
        assert_eq!(picked.rows(), &[vec![2], vec![0]]);
    }
}
