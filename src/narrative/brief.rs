use std::fmt;

use crate::balance::WaterBalance;
use crate::forecast::{ForecastEstimate, TargetMonth};

/// Section titles the narrative must use, in order
pub const SECTIONS: [&str; 6] = [
    "📊 Oferta y Demanda",
    "⚖️ Balance hídrico integrado",
    "🌦️ Clima y factores externos",
    "🚨 Riesgos y consecuencias",
    "💡 Recomendaciones técnicas",
    "📝 Conclusión ejecutiva",
];

/// Traffic-light risk level the narrative must state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Red,
    Yellow,
    Green,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Red, RiskLevel::Yellow, RiskLevel::Green];

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Red => "rojo",
            RiskLevel::Yellow => "amarillo",
            RiskLevel::Green => "verde",
        }
    }
}

/// Numeric inputs of one narrative request
#[derive(Debug, Clone)]
pub struct NarrativeBrief {
    pub target: TargetMonth,
    pub balance: WaterBalance,
    pub precipitation: ForecastEstimate,
    pub temperature: ForecastEstimate,
}

impl NarrativeBrief {
    pub fn new(
        target: TargetMonth,
        balance: WaterBalance,
        precipitation: ForecastEstimate,
        temperature: ForecastEstimate,
    ) -> Self {
        Self {
            target,
            balance,
            precipitation,
            temperature,
        }
    }
}

impl fmt::Display for NarrativeBrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.balance;

        writeln!(
            f,
            "Genera un análisis técnico del riesgo hídrico en la zona de Papallacta a partir del caudal, \
             la precipitación y la temperatura estimados. Entrega solo el contenido, sin presentarlo ni \
             explicar su propósito, y sin expresiones como 'este bloque' o 'este análisis'."
        )?;
        writeln!(f)?;
        writeln!(f, "Variables de oferta y clima:")?;
        writeln!(f, "- 💧 Caudal estimado: {} l/s", b.supply_lps)?;
        writeln!(f, "- ☔ Precipitación mensual: {} mm", self.precipitation)?;
        writeln!(f, "- 🌡️ Temperatura media: {} °C", self.temperature)?;
        writeln!(f)?;
        writeln!(f, "Contexto:")?;
        writeln!(f, "- 📅 Fecha de evaluación: {}", self.target)?;
        writeln!(f, "- 👥 Población atendida: {} habitantes", group_thousands(b.population))?;
        writeln!(f, "- 🚿 Consumo per cápita: {} l/día", b.per_capita_demand_l_per_day)?;
        writeln!(
            f,
            "- Demanda: {} l/día ({:.2} l/s)",
            group_thousands(b.daily_demand_liters().round() as u64),
            b.demand_lps
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Analiza las variables como un sistema que interactúa, no por separado: explica cómo \
             afectan juntas a la disponibilidad de agua, al riesgo de escasez y a la sostenibilidad de la oferta."
        )?;
        writeln!(f)?;
        writeln!(f, "Organiza el análisis en estas secciones, con estos títulos:")?;
        for section in SECTIONS {
            writeln!(f, "{section}")?;
        }
        writeln!(f)?;
        let levels: Vec<&str> = RiskLevel::ALL.iter().map(RiskLevel::label).collect();
        writeln!(
            f,
            "Semáforo de riesgo: indica siempre uno de estos colores ({}) según tu análisis.",
            levels.join(", ")
        )?;
        writeln!(f)?;
        write!(
            f,
            "Usa un lenguaje claro y accesible para el público general, sin tecnicismos complejos y sin \
             escribirlo como código HTML, pero realiza los cálculos necesarios para que el resultado se vea \
             limpio y visualmente atractivo."
        )
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
