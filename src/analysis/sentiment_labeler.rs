use {
    crate::{
        config::Margin,
        domain::{Move, PredictedClass, SentimentTriple},
    },
    std::cmp::Ordering,
};

/// Turns a probability triple into one class using a disambiguation margin.
pub struct SentimentLabeler;

impl SentimentLabeler {
    /// Classes by probability, highest first. Equal probabilities keep the
    /// enum order, so Bear outranks Neutral outranks Bull on a tie.
    pub fn rank_classes(triple: &SentimentTriple) -> [PredictedClass; 3] {
        let mut ranked = [
            PredictedClass::Bear,
            PredictedClass::Neutral,
            PredictedClass::Bull,
        ];
        ranked.sort_by(|a, b| {
            triple
                .probability(*b)
                .partial_cmp(&triple.probability(*a))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
        ranked
    }

    /// Top class when it leads the runner-up by at least `margin`, otherwise the runner-up.
    pub fn label(triple: &SentimentTriple, margin: Margin) -> PredictedClass {
        let [top, second, _] = Self::rank_classes(triple);
        // Plain f64 subtraction: 0.5 - 0.4 is a hair under 0.1, and stays that way.
        let gap = triple.probability(top) - triple.probability(second);
        if gap >= margin.value() { top } else { second }
    }

    pub fn predict_move(triple: &SentimentTriple, margin: Margin) -> Move {
        Self::label(triple, margin).to_move()
    }
}
