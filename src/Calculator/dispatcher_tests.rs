#[cfg(test)]
mod tests {
    use crate::Calculator::calc_errors::CalcError;
    use crate::Calculator::dispatcher::*;
    use crate::Calculator::equation_balancer::BalanceMethod;
    use crate::Calculator::molmass::Dilution;
    use crate::settings::CalcSettings;
    use approx::assert_relative_eq;

    fn limiting_h2_o2() -> LimitingRequest {
        LimitingRequest {
            coef_a: 1.0,
            coef_b: 1.0,
            formula_a: "H2".to_string(),
            formula_b: "O2".to_string(),
            mass_a: 4.0,
            mass_b: 32.0,
            coef_p: 2.0,
            formula_p: "H2O".to_string(),
        }
    }

    #[test]
    fn test_molar_mass_request() {
        let result = evaluate(&CalcRequest::MolarMass {
            formula: " H2O ".to_string(),
        });
        assert_eq!(result.title, "Molar mass");
        assert_eq!(result.summary, "H2O → 18.01528 g·mol⁻¹");
        let details = result.details.clone().unwrap();
        assert_eq!(details.lines().count(), 2);
        assert!(details.starts_with("H × 2 × 1.00794 = 2.0159 g"));
        let table = result.table.clone().unwrap();
        assert_eq!(table[0].label, "H (2)");
        assert_eq!(table[1].label, "O (1)");
        assert!(table[1].value.starts_with("15.9994 g"));
        assert!(!result.is_error());
        // Display renders the table as well
        let shown = result.to_string();
        assert!(shown.contains("Molar mass"));
        assert!(shown.contains("O (1)"));
    }

    #[test]
    fn test_unknown_element_result() {
        let result = evaluate(&CalcRequest::MolarMass {
            formula: "Xx2O".to_string(),
        });
        assert!(result.is_error());
        assert_eq!(result.title, "Molar mass");
        assert_eq!(result.details.as_deref(), Some("Unknown element: Xx"));
    }

    #[test]
    fn test_oversized_count_result() {
        let result = evaluate(&CalcRequest::MolarMass {
            formula: "H99999999999999999999999".to_string(),
        });
        assert!(result.is_error());
        assert_eq!(result.details.as_deref(), Some("Atom count of H is too large"));
        let result = evaluate(&CalcRequest::Balance {
            lhs: vec!["H99999999999999999999999".to_string()],
            rhs: vec!["H".to_string()],
        });
        assert!(result.is_error());
    }

    #[test]
    fn test_grams_and_moles_requests() {
        let result = evaluate(&CalcRequest::GramsToMoles {
            formula: "H2O".to_string(),
            grams: 36.03056,
        });
        assert_eq!(result.summary, "36.03056 g of H2O = 2 mol");
        assert_eq!(
            result.details.as_deref(),
            Some("Molar mass: 18.01528 g·mol⁻¹")
        );
        let result = evaluate(&CalcRequest::MolesToGrams {
            formula: "H2O".to_string(),
            moles: 2.0,
        });
        assert_eq!(result.summary, "2 mol of H2O = 36.03056 g");
        let result = evaluate(&CalcRequest::GramsToMoles {
            formula: "".to_string(),
            grams: 1.0,
        });
        assert!(result.is_error());
    }

    #[test]
    fn test_molarity_request() {
        let result = evaluate(&CalcRequest::Molarity {
            formula: "NaCl".to_string(),
            grams: 58.442769,
            volume_l: 0.5,
        });
        assert_eq!(result.summary, "2 M");
        let result = evaluate(&CalcRequest::Molarity {
            formula: "NaCl".to_string(),
            grams: 1.0,
            volume_l: 0.0,
        });
        assert_eq!(result.details.as_deref(), Some("Volume must be > 0 L"));
    }

    #[test]
    fn test_dilution_request() {
        let result = evaluate(&CalcRequest::Dilution(Dilution {
            m1: Some(2.0),
            v1: Some(0.5),
            m2: None,
            v2: Some(1.0),
        }));
        assert_eq!(result.title, "Dilution");
        assert_eq!(result.summary, "M2 = 1");
        let result = evaluate(&CalcRequest::Dilution(Dilution::default()));
        assert_eq!(result.title, "Dilution (M1V1=M2V2)");
        assert_eq!(
            result.details.as_deref(),
            Some("Provide exactly three values (one missing)")
        );
    }

    #[test]
    fn test_balance_request() {
        let req = CalcRequest::Balance {
            lhs: vec!["H2".to_string(), "O2".to_string()],
            rhs: vec!["H2O".to_string()],
        };
        let result = evaluate(&req);
        assert_eq!(result.title, "Balanced equation");
        assert_eq!(result.summary, "2 H2 + 1 O2 → 2 H2O");
        let settings = CalcSettings {
            balance_method: BalanceMethod::trial_scale(),
            ..CalcSettings::default()
        };
        assert_eq!(evaluate_with(&req, &settings).summary, "2 H2 + 1 O2 → 2 H2O");

        let result = evaluate(&CalcRequest::Balance {
            lhs: vec!["H2".to_string()],
            rhs: vec!["O2".to_string()],
        });
        assert_eq!(result.title, "Balance equation");
        assert_eq!(
            result.details,
            Some(CalcError::BalanceFailed.to_string())
        );
    }

    #[test]
    fn test_stoichiometry() {
        // 2 H2 + O2 -> 2 H2O, 4.03176 g H2 = 2 mol -> 2 mol H2O
        let req = StoichRequest {
            coef_a: 2.0,
            coef_p: 2.0,
            formula_a: "H2".to_string(),
            formula_p: "H2O".to_string(),
            mass_a: 4.03176,
        };
        let report = stoichiometry(&req).unwrap();
        assert_relative_eq!(report.moles_a, 2.0, epsilon = 1e-9);
        assert_relative_eq!(report.moles_product, 2.0, epsilon = 1e-9);
        assert_relative_eq!(report.grams_product, 36.03056, epsilon = 1e-6);
        let result = evaluate(&CalcRequest::Stoich(req.clone()));
        assert_eq!(result.summary, "From 4.03176 g H2 → 2 mol H2O = 36.03056 g");

        let bad = StoichRequest {
            formula_p: "Xx".to_string(),
            ..req.clone()
        };
        assert_eq!(
            stoichiometry(&bad),
            Err(CalcError::UnknownElement("Xx".to_string()))
        );
        let zero = StoichRequest { coef_a: 0.0, ..req };
        assert_eq!(
            stoichiometry(&zero),
            Err(CalcError::InvalidCoefficient("H2".to_string()))
        );
    }

    #[test]
    fn test_limiting_reagent() {
        let report = limiting_reagent(&limiting_h2_o2()).unwrap();
        assert_eq!(report.limiting, Reagent::B);
        assert_relative_eq!(report.moles_product, 2.0, epsilon = 1e-3);
        assert_relative_eq!(report.grams_product, 36.03, epsilon = 1e-2);

        let result = evaluate(&CalcRequest::Limiting(limiting_h2_o2()));
        assert_eq!(result.summary, "Limiting: B (O2)");
        assert!(result.details.unwrap().starts_with("Product: "));

        let mut req = limiting_h2_o2();
        req.mass_a = 1.0;
        assert_eq!(limiting_reagent(&req).unwrap().limiting, Reagent::A);
        req.formula_b = "Qq2".to_string();
        assert!(limiting_reagent(&req).is_err());
    }

    #[test]
    fn test_strict_formulas_setting() {
        let settings = CalcSettings {
            strict_formulas: true,
            ..CalcSettings::default()
        };
        let req = CalcRequest::MolarMass {
            formula: "Ca(OH".to_string(),
        };
        assert!(evaluate_with(&req, &settings).is_error());
        assert!(!evaluate(&req).is_error());
    }

    #[test]
    fn test_json_requests() {
        let settings = CalcSettings::default();
        let result = evaluate_json(r#"{"mode":"molar-mass","formula":"NaCl"}"#, &settings);
        assert_eq!(result.summary, "NaCl → 58.442769 g·mol⁻¹");

        let result = evaluate_json(
            r#"{"mode":"balance","lhs":["CH4","O2"],"rhs":["CO2","H2O"]}"#,
            &settings,
        );
        assert_eq!(result.summary, "1 CH4 + 2 O2 → 1 CO2 + 2 H2O");

        let result = evaluate_json(r#"{"mode":"dilution","M1":2,"V1":0.5,"V2":1}"#, &settings);
        assert_eq!(result.summary, "M2 = 1");

        let result = evaluate_json(
            r#"{"mode":"limiting","coefA":1,"coefB":1,"formulaA":"H2","formulaB":"O2","massA":4,"massB":32,"coefP":2,"formulaP":"H2O"}"#,
            &settings,
        );
        assert_eq!(result.summary, "Limiting: B (O2)");

        let result = evaluate_json(
            r#"{"mode":"stoich","formulaA":"H2","formulaP":"H2O","massA":4.03176}"#,
            &settings,
        );
        assert!(!result.is_error());

        let result = evaluate_json(r#"{"mode":"volume","formula":"H2O"}"#, &settings);
        assert!(result.is_error());
        assert_eq!(result.title, "Request");
        assert!(evaluate_json("not json", &settings).is_error());
    }

    #[test]
    fn test_result_serialization() {
        let result = evaluate(&CalcRequest::Dilution(Dilution {
            m1: Some(2.0),
            v1: Some(0.5),
            m2: None,
            v2: Some(1.0),
        }));
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"title":"Dilution","summary":"M2 = 1"}"#);
        let req: CalcRequest =
            serde_json::from_str(&serde_json::to_string(&CalcRequest::MolarMass {
                formula: "H2O".to_string(),
            })
            .unwrap())
            .unwrap();
        assert_eq!(
            req,
            CalcRequest::MolarMass {
                formula: "H2O".to_string()
            }
        );
    }
}
