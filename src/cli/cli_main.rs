use crate::Calculator::dispatcher::{
    CalcRequest, LimitingRequest, StoichRequest, evaluate_json, evaluate_with,
};
use crate::Calculator::formula_parser::parse_equation;
use crate::Calculator::molmass::Dilution;
use crate::settings::CalcSettings;
use std::io::{self, BufRead, Write};

pub fn run_interactive_menu(settings: &CalcSettings) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_menu(&mut stdin.lock(), &mut stdout.lock(), settings)
}

/// menu loop over any reader/writer pair; ends on "0" or end of input
pub fn run_menu<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    settings: &CalcSettings,
) -> io::Result<()> {
    let mut prompter = Prompter { input, output };
    loop {
        show_main_menu(&mut *prompter.output)?;
        let Some(choice) = prompter.text("\x1b[36mEnter your choice: \x1b[0m")? else {
            writeln!(prompter.output, "Goodbye!")?;
            break;
        };
        let result = match choice.as_str() {
            "0" => {
                writeln!(prompter.output, "Goodbye!")?;
                break;
            }
            "9" => match prompter.text("JSON request: ")? {
                Some(json) => Some(evaluate_json(&json, settings)),
                None => None,
            },
            "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" => {
                build_request(&choice, &mut prompter)?.map(|req| evaluate_with(&req, settings))
            }
            _ => {
                writeln!(prompter.output, "Invalid choice. Please try again.")?;
                None
            }
        };
        if let Some(result) = result {
            writeln!(prompter.output, "\n{}", result)?;
        }
    }
    Ok(())
}
/* colors
Blue (\x1b[34m) - header text
Yellow (\x1b[33m) - menu options
Cyan (\x1b[36m) - "Enter your choice:" prompt
Reset (\x1b[0m) - back to normal color
*/
fn show_main_menu<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output, "\x1b[34m\n Chemistry calculator \x1b[0m")?;
    writeln!(output, "\x1b[33m1. Molar mass\x1b[0m")?;
    writeln!(output, "\x1b[33m2. Grams → Moles\x1b[0m")?;
    writeln!(output, "\x1b[33m3. Moles → Grams\x1b[0m")?;
    writeln!(output, "\x1b[33m4. Molarity (from mass)\x1b[0m")?;
    writeln!(output, "\x1b[33m5. Dilution (M1V1=M2V2)\x1b[0m")?;
    writeln!(output, "\x1b[33m6. Balance equation\x1b[0m")?;
    writeln!(output, "\x1b[33m7. Stoichiometry (mass → product)\x1b[0m")?;
    writeln!(output, "\x1b[33m8. Limiting reagent\x1b[0m")?;
    writeln!(output, "\x1b[33m9. JSON request\x1b[0m")?;
    writeln!(output, "\x1b[33m0. Exit\x1b[0m")
}

struct Prompter<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    /// trimmed line, None at end of input
    fn text(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// empty input gives Some(None)
    fn optional_number(&mut self, label: &str) -> io::Result<Option<Option<f64>>> {
        let Some(text) = self.text(label)? else {
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(Some(None));
        }
        match text.parse::<f64>() {
            Ok(x) => Ok(Some(Some(x))),
            Err(_) => {
                writeln!(self.output, "Invalid number: {}", text)?;
                Ok(None)
            }
        }
    }

    fn number(&mut self, label: &str) -> io::Result<Option<f64>> {
        Ok(self.optional_number(label)?.flatten())
    }

    /// number with a default for empty input
    fn number_or(&mut self, label: &str, default: f64) -> io::Result<Option<f64>> {
        Ok(self.optional_number(label)?.map(|x| x.unwrap_or(default)))
    }
}

fn build_request<R: BufRead, W: Write>(
    choice: &str,
    p: &mut Prompter<'_, R, W>,
) -> io::Result<Option<CalcRequest>> {
    macro_rules! ask {
        ($e:expr) => {
            match $e? {
                Some(v) => v,
                None => return Ok(None),
            }
        };
    }
    let req = match choice {
        "1" => CalcRequest::MolarMass {
            formula: ask!(p.text("Formula: ")),
        },
        "2" => CalcRequest::GramsToMoles {
            formula: ask!(p.text("Formula: ")),
            grams: ask!(p.number("Grams: ")),
        },
        "3" => CalcRequest::MolesToGrams {
            formula: ask!(p.text("Formula: ")),
            moles: ask!(p.number("Moles: ")),
        },
        "4" => CalcRequest::Molarity {
            formula: ask!(p.text("Formula: ")),
            grams: ask!(p.number("Grams: ")),
            volume_l: ask!(p.number("Volume, L: ")),
        },
        "5" => {
            writeln!(p.output, "Leave the unknown value empty")?;
            CalcRequest::Dilution(Dilution {
                m1: ask!(p.optional_number("M1: ")),
                v1: ask!(p.optional_number("V1: ")),
                m2: ask!(p.optional_number("M2: ")),
                v2: ask!(p.optional_number("V2: ")),
            })
        }
        "6" => {
            let equation = ask!(p.text("Equation (e.g. H2 + O2 -> H2O): "));
            match parse_equation(&equation) {
                Ok((lhs, rhs)) => CalcRequest::Balance { lhs, rhs },
                Err(e) => {
                    writeln!(p.output, "{}", e)?;
                    return Ok(None);
                }
            }
        }
        "7" => CalcRequest::Stoich(StoichRequest {
            formula_a: ask!(p.text("Reactant A formula: ")),
            coef_a: ask!(p.number_or("Coefficient of A [1]: ", 1.0)),
            mass_a: ask!(p.number("Mass of A, g: ")),
            formula_p: ask!(p.text("Product P formula: ")),
            coef_p: ask!(p.number_or("Coefficient of P [1]: ", 1.0)),
        }),
        "8" => CalcRequest::Limiting(LimitingRequest {
            formula_a: ask!(p.text("Reactant A formula: ")),
            coef_a: ask!(p.number_or("Coefficient of A [1]: ", 1.0)),
            mass_a: ask!(p.number("Mass of A, g: ")),
            formula_b: ask!(p.text("Reactant B formula: ")),
            coef_b: ask!(p.number_or("Coefficient of B [1]: ", 1.0)),
            mass_b: ask!(p.number("Mass of B, g: ")),
            formula_p: ask!(p.text("Product P formula: ")),
            coef_p: ask!(p.number_or("Coefficient of P [1]: ", 1.0)),
        }),
        _ => return Ok(None),
    };
    Ok(Some(req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(script: &str) -> String {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        run_menu(&mut input, &mut output, &CalcSettings::default()).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_molar_mass_from_menu() {
        let out = run("1\nH2O\n0\n");
        assert!(out.contains("H2O → 18.01528 g·mol⁻¹"));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }

    #[test]
    fn test_balance_from_menu() {
        let out = run("6\nH2 + O2 -> H2O\n0\n");
        assert!(out.contains("2 H2 + 1 O2 → 2 H2O"));
        let out = run("6\nH2 + O2\n0\n");
        assert!(out.contains("has no arrow"));
    }

    #[test]
    fn test_dilution_from_menu() {
        let out = run("5\n2\n0.5\n\n1\n0\n");
        assert!(out.contains("M2 = 1"));
    }

    #[test]
    fn test_limiting_from_menu() {
        let out = run("8\nH2\n\n4\nO2\n1\n32\nH2O\n2\n0\n");
        assert!(out.contains("Limiting: B (O2)"));
    }

    #[test]
    fn test_json_and_bad_input() {
        let out = run("9\n{\"mode\":\"moles-to-grams\",\"formula\":\"H2O\",\"moles\":2}\n0\n");
        assert!(out.contains("2 mol of H2O = 36.03056 g"));
        let out = run("x\n2\nH2O\nmany\n");
        assert!(out.contains("Invalid choice"));
        assert!(out.contains("Invalid number: many"));
        // end of input leaves the menu
        assert!(out.trim_end().ends_with("Goodbye!"));
    }
}
