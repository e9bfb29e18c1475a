use colored::Colorize;

use crate::error::Result;
use crate::fmt::money;
use crate::prediction::{
    FraudFeatures, HttpPredictor, Prediction, PredictionRequest, Predictor, SpendFeatures,
};
use crate::settings::load_settings;

fn predictor() -> Result<HttpPredictor> {
    let settings = load_settings();
    let (url, key) = settings.prediction_endpoint()?;
    HttpPredictor::new(url, key)
}

fn print_prediction(prediction: &Prediction) {
    match prediction {
        Prediction::Fraud(p) => {
            let label = if p.fraud_label == 1 {
                "FRAUD".red().bold()
            } else {
                "legitimate".green()
            };
            println!("Fraud probability: {:.1}%", p.fraud_probability * 100.0);
            println!("Prediction:        {label}");
        }
        Prediction::Spend(p) => {
            println!("Predicted monthly spending: {}", money(p.predicted_spending));
        }
    }
}

fn run(request: PredictionRequest) -> Result<()> {
    request.validate()?;
    let predictor = predictor()?;
    log::info!("requesting {} prediction from {}", request.task(), predictor.endpoint());
    let prediction = predictor.predict(&request)?;
    print_prediction(&prediction);
    Ok(())
}

pub fn fraud(amount: f64, hour: u32, mcc: u32, zip: String, method: String) -> Result<()> {
    run(PredictionRequest::Fraud(FraudFeatures {
        amount,
        hour,
        mcc,
        zip,
        method,
    }))
}

pub fn spend(age: u32, income: f64, avg_monthly_spend: f64) -> Result<()> {
    run(PredictionRequest::Spend(SpendFeatures {
        age,
        income,
        avg_monthly_spend,
    }))
}
