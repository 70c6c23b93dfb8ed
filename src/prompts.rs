/// Instructional prompt for the segmentation task. Worked examples map a
/// concatenated phrase to its insertion-position list; positions are
/// character indices after which a space goes.
const SEGMENTATION_TEMPLATE: &str = r#"<task>Задача: найти позиции где нужно вставить пробелы в тексте без пробелов (задача word segmentation).
Требуется вернуть только ответ, а именно числа, перечисленные через запятую в квадратных скобках.</task>

<note>ВАЖНО: Отвечай только списком чисел в квадратных скобках. Никаких объяснений, рассуждений или дополнительного текста.</note>
<examples>
    <text>
    куплюайфон17max
    </text>
    <answer>
    [5, 11, 13]
    </answer>
    <text>
    ищудомвПодмосковье
    </text>
    <answer>
    [3, 6, 7]
    </answer>
    <text>
    сдаюквартирусмебельюитехникой
    </text>
    <answer>
    [4, 12, 13, 21, 22]
    </answer>
</examples>
<input>
    <text>
    {text}
    </text>
</input>
"#;

/// Build the full prompt for one target string.
pub fn segmentation_prompt(text: &str) -> String {
    SEGMENTATION_TEMPLATE.replace("{text}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_target() {
        let p = segmentation_prompt("куплюдиван");
        assert!(p.contains("куплюдиван"));
        assert!(!p.contains("{text}"));
    }

    #[test]
    fn test_prompt_keeps_worked_examples() {
        let p = segmentation_prompt("x");
        assert!(p.contains("[5, 11, 13]"));
        assert!(p.contains("ищудомвПодмосковье"));
    }
}
