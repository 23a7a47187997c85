use ndarray::{concatenate, s, Array1, Array2, Axis};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read artifact: {0}")]
    Io(String),

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// A pretrained one-step regressor over a fixed window of scaled values.
pub trait SequenceModel: Send + Sync {
    /// Number of values the model reads per prediction
    fn lookback(&self) -> usize;

    /// Predicts the next scaled value. `window` holds exactly `lookback()`
    /// values, oldest first; any other length is a shape error.
    fn predict(&self, window: &[f64]) -> Result<f64, ModelError>;
}

fn default_input_size() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct DirectionWeights {
    weight_ih: Vec<Vec<f64>>,
    weight_hh: Vec<Vec<f64>>,
    bias_ih: Vec<f64>,
    bias_hh: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LayerWeights {
    forward: DirectionWeights,
    reverse: DirectionWeights,
}

#[derive(Debug, Deserialize)]
struct LinearWeights {
    weight: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    seq_length: usize,
    hidden_size: usize,
    num_layers: usize,
    #[serde(default = "default_input_size")]
    input_size: usize,
    layers: Vec<LayerWeights>,
    fc: LinearWeights,
}

fn matrix(name: &str, rows: Vec<Vec<f64>>, shape: (usize, usize)) -> Result<Array2<f64>, ModelError> {
    if rows.len() != shape.0 || rows.iter().any(|r| r.len() != shape.1) {
        return Err(ModelError::Shape(format!(
            "{} expected {}x{}, got {}x{}",
            name,
            shape.0,
            shape.1,
            rows.len(),
            rows.first().map(Vec::len).unwrap_or(0)
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec(shape, flat).map_err(|e| ModelError::Shape(format!("{}: {}", name, e)))
}

fn vector(name: &str, values: Vec<f64>, len: usize) -> Result<Array1<f64>, ModelError> {
    if values.len() != len {
        return Err(ModelError::Shape(format!(
            "{} expected length {}, got {}",
            name,
            len,
            values.len()
        )));
    }
    Ok(Array1::from(values))
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Single-direction LSTM weights with the four gates stacked in
/// `i, f, g, o` order along the first axis.
#[derive(Debug, Clone)]
struct LstmDirection {
    hidden_size: usize,
    weight_ih: Array2<f64>,
    weight_hh: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmDirection {
    fn from_weights(
        name: &str,
        w: DirectionWeights,
        input_size: usize,
        hidden_size: usize,
    ) -> Result<Self, ModelError> {
        let gates = 4 * hidden_size;
        let weight_ih = matrix(&format!("{}.weight_ih", name), w.weight_ih, (gates, input_size))?;
        let weight_hh = matrix(&format!("{}.weight_hh", name), w.weight_hh, (gates, hidden_size))?;
        let bias_ih = vector(&format!("{}.bias_ih", name), w.bias_ih, gates)?;
        let bias_hh = vector(&format!("{}.bias_hh", name), w.bias_hh, gates)?;

        Ok(Self {
            hidden_size,
            weight_ih,
            weight_hh,
            bias: bias_ih + bias_hh,
        })
    }

    /// Runs the cell over `inputs` (rows are time steps) and returns the
    /// hidden state at every step, in input order.
    fn run(&self, inputs: &Array2<f64>, reverse: bool) -> Array2<f64> {
        let steps = inputs.nrows();
        let hs = self.hidden_size;
        let mut h = Array1::<f64>::zeros(hs);
        let mut c = Array1::<f64>::zeros(hs);
        let mut out = Array2::<f64>::zeros((steps, hs));

        let order: Box<dyn Iterator<Item = usize>> = if reverse {
            Box::new((0..steps).rev())
        } else {
            Box::new(0..steps)
        };

        for t in order {
            let gates = self.weight_ih.dot(&inputs.row(t)) + self.weight_hh.dot(&h) + &self.bias;
            let i = gates.slice(s![0..hs]).mapv(sigmoid);
            let f = gates.slice(s![hs..2 * hs]).mapv(sigmoid);
            let g = gates.slice(s![2 * hs..3 * hs]).mapv(f64::tanh);
            let o = gates.slice(s![3 * hs..4 * hs]).mapv(sigmoid);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f64::tanh);
            out.row_mut(t).assign(&h);
        }

        out
    }
}

/// Bidirectional stacked LSTM with a linear head on the final time step.
#[derive(Debug, Clone)]
pub struct BiLstmModel {
    seq_length: usize,
    layers: Vec<(LstmDirection, LstmDirection)>,
    fc_weight: Array1<f64>,
    fc_bias: f64,
}

impl BiLstmModel {
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;
        Self::from_artifact(artifact)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if artifact.seq_length == 0 || artifact.hidden_size == 0 {
            return Err(ModelError::Invalid("seq_length and hidden_size must be positive".into()));
        }
        // Windows are single-feature series of scaled differences
        if artifact.input_size != 1 {
            return Err(ModelError::Invalid(format!(
                "input_size must be 1, got {}",
                artifact.input_size
            )));
        }
        if artifact.layers.len() != artifact.num_layers || artifact.num_layers == 0 {
            return Err(ModelError::Shape(format!(
                "num_layers is {} but {} layers were supplied",
                artifact.num_layers,
                artifact.layers.len()
            )));
        }

        let hidden = artifact.hidden_size;
        let mut layers = Vec::with_capacity(artifact.num_layers);
        for (idx, layer) in artifact.layers.into_iter().enumerate() {
            let input_size = if idx == 0 { 1 } else { 2 * hidden };
            let fwd = LstmDirection::from_weights(&format!("layers[{}].forward", idx), layer.forward, input_size, hidden)?;
            let rev = LstmDirection::from_weights(&format!("layers[{}].reverse", idx), layer.reverse, input_size, hidden)?;
            layers.push((fwd, rev));
        }

        let fc = matrix("fc.weight", artifact.fc.weight, (1, 2 * hidden))?;
        let fc_bias = vector("fc.bias", artifact.fc.bias, 1)?;

        Ok(Self {
            seq_length: artifact.seq_length,
            layers,
            fc_weight: fc.row(0).to_owned(),
            fc_bias: fc_bias[0],
        })
    }
}

impl SequenceModel for BiLstmModel {
    fn lookback(&self) -> usize {
        self.seq_length
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        if window.len() != self.seq_length {
            return Err(ModelError::Shape(format!(
                "window expected length {}, got {}",
                self.seq_length,
                window.len()
            )));
        }
        let mut x = Array2::from_shape_vec((window.len(), 1), window.to_vec())
            .map_err(|e| ModelError::Shape(e.to_string()))?;

        for (fwd, rev) in &self.layers {
            let forward = fwd.run(&x, false);
            let backward = rev.run(&x, true);
            x = concatenate(Axis(1), &[forward.view(), backward.view()])
                .map_err(|e| ModelError::Shape(e.to_string()))?;
        }

        Ok(x.row(self.seq_length - 1).dot(&self.fc_weight) + self.fc_bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn zeros(rows: usize, cols: usize) -> Value {
        json!(vec![vec![0.0; cols]; rows])
    }

    fn direction(hidden: usize, input: usize) -> Value {
        json!({
            "weight_ih": zeros(4 * hidden, input),
            "weight_hh": zeros(4 * hidden, hidden),
            "bias_ih": vec![0.0; 4 * hidden],
            "bias_hh": vec![0.0; 4 * hidden],
        })
    }

    fn artifact(hidden: usize, layers: usize, fc_bias: f64) -> Value {
        let layer_values: Vec<Value> = (0..layers)
            .map(|i| {
                let input = if i == 0 { 1 } else { 2 * hidden };
                json!({ "forward": direction(hidden, input), "reverse": direction(hidden, input) })
            })
            .collect();
        json!({
            "seq_length": 4,
            "hidden_size": hidden,
            "num_layers": layers,
            "layers": layer_values,
            "fc": { "weight": zeros(1, 2 * hidden), "bias": [fc_bias] },
        })
    }

    #[test]
    fn test_zero_weights_predict_head_bias() {
        let model = BiLstmModel::from_json(&artifact(3, 2, 0.37).to_string()).unwrap();
        assert_eq!(model.lookback(), 4);
        assert!((model.predict(&[0.1, 0.5, 0.9, 0.2]).unwrap() - 0.37).abs() < 1e-12);
    }

    #[test]
    fn test_single_unit_cell_matches_hand_computation() {
        // One hidden unit, input gate and candidate driven by x only.
        let dir = json!({
            "weight_ih": [[1.0], [0.0], [1.0], [0.0]],
            "weight_hh": [[0.0], [0.0], [0.0], [0.0]],
            "bias_ih": [0.0, 0.0, 0.0, 0.0],
            "bias_hh": [0.0, 0.0, 0.0, 0.0],
        });
        let raw = json!({
            "seq_length": 1,
            "hidden_size": 1,
            "num_layers": 1,
            "layers": [{ "forward": dir.clone(), "reverse": dir }],
            "fc": { "weight": [[1.0, 1.0]], "bias": [0.0] },
        });
        let model = BiLstmModel::from_json(&raw.to_string()).unwrap();

        let x: f64 = 0.8;
        let c = sigmoid(x) * x.tanh();
        let h = 0.5 * c.tanh();
        assert!((model.predict(&[x]).unwrap() - 2.0 * h).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_gate_rows() {
        let mut raw = artifact(2, 1, 0.0);
        raw["layers"][0]["forward"]["weight_ih"] = zeros(7, 1);
        let err = BiLstmModel::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, ModelError::Shape(_)));
        assert!(err.to_string().contains("layers[0].forward.weight_ih"));
    }

    #[test]
    fn test_rejects_layer_count_mismatch() {
        let mut raw = artifact(2, 2, 0.0);
        raw["num_layers"] = json!(3);
        assert!(matches!(
            BiLstmModel::from_json(&raw.to_string()),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn test_second_layer_reads_both_directions() {
        let mut raw = artifact(2, 2, 0.0);
        raw["layers"][1]["reverse"]["weight_ih"] = zeros(8, 2);
        assert!(BiLstmModel::from_json(&raw.to_string()).is_err());
    }

    #[test]
    fn test_rejects_multi_feature_input() {
        let mut raw = artifact(2, 1, 0.0);
        raw["seq_length"] = json!(5);
        raw["input_size"] = json!(3);
        raw["layers"][0]["forward"]["weight_ih"] = zeros(8, 3);
        raw["layers"][0]["reverse"]["weight_ih"] = zeros(8, 3);
        let err = BiLstmModel::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));
        assert!(err.to_string().contains("input_size"));
    }

    #[test]
    fn test_window_length_must_match_lookback() {
        let model = BiLstmModel::from_json(&artifact(2, 1, 0.1).to_string()).unwrap();
        assert!(matches!(model.predict(&[0.1, 0.2, 0.3]), Err(ModelError::Shape(_))));
        assert!(matches!(model.predict(&[0.1, 0.2, 0.3, 0.4, 0.5]), Err(ModelError::Shape(_))));
        assert!(model.predict(&[0.1, 0.2, 0.3, 0.4]).is_ok());
    }
}
