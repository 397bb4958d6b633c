//! Prompt construction for analysis requests and chat turns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::profile::DatasetProfile;

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a data science assistant that analyzes tabular datasets \
and writes Python code using pandas and matplotlib/seaborn. Always answer in the requested sections.";

pub const CHAT_SYSTEM_PROMPT: &str = "You are a data analysis assistant. You help users explore a dataset \
by proposing hypotheses and the Python code that tests them.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Histogram,
    Scatter,
    Bar,
    Box,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Histogram => "histogram",
            ChartType::Scatter => "scatter",
            ChartType::Bar => "bar",
            ChartType::Box => "box",
        }
    }

    /// First chart type named in the query, if any.
    pub fn detect(query: &str) -> Option<Self> {
        query
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find_map(|word| match word {
                "histogram" | "histograms" | "hist" => Some(ChartType::Histogram),
                "scatter" | "scatterplot" => Some(ChartType::Scatter),
                "bar" | "bars" | "barplot" => Some(ChartType::Bar),
                "box" | "boxplot" | "boxplots" => Some(ChartType::Box),
                _ => None,
            })
    }

    fn guidance(&self) -> &'static str {
        match self {
            ChartType::Histogram => {
                "Create a histogram with appropriate bins. Include:\n\
                 - A title describing what is being shown\n\
                 - Labeled axes with units if applicable\n\
                 - Grid lines for better readability\n\
                 - Statistics like mean or median shown as vertical lines"
            }
            ChartType::Scatter => {
                "Create a scatter plot with clear point markers. Include:\n\
                 - A title describing the relationship being explored\n\
                 - Labeled axes with units if applicable\n\
                 - A legend if using colors to represent categories\n\
                 - A trend line if appropriate"
            }
            ChartType::Bar => {
                "Create a bar chart with clear bars. Include:\n\
                 - A descriptive title\n\
                 - Labeled axes with units if applicable\n\
                 - Value labels on top of each bar\n\
                 - Bars sorted when that helps reading"
            }
            ChartType::Box => {
                "Create a box plot that shows the distribution. Include:\n\
                 - A descriptive title\n\
                 - Labeled axes with units if applicable\n\
                 - Clear labels for each category being compared\n\
                 - Individual data points with jitter if useful"
            }
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "histogram" => Ok(ChartType::Histogram),
            "scatter" => Ok(ChartType::Scatter),
            "bar" => Ok(ChartType::Bar),
            "box" => Ok(ChartType::Box),
            other => Err(CoreError::Validation(format!("Unknown chart type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptStrategy {
    ZeroShot,
    FewShot,
    Specialized(ChartType),
}

impl PromptStrategy {
    /// Chart-specific guidance when the query names a chart, worked
    /// examples otherwise.
    pub fn for_query(query: &str) -> Self {
        match ChartType::detect(query) {
            Some(chart) => PromptStrategy::Specialized(chart),
            None => PromptStrategy::FewShot,
        }
    }
}

struct Example {
    dataset: &'static str,
    query: &'static str,
    code: &'static str,
}

const FEW_SHOT_EXAMPLES: &[Example] = &[
    Example {
        dataset: "Titanic",
        query: "Plot survival rate by passenger class",
        code: "survival_by_class = df.groupby('pclass')['survived'].mean() * 100\n\
plt.figure(figsize=(10, 6))\n\
ax = survival_by_class.plot(kind='bar', color='skyblue')\n\
plt.title('Survival Rate by Passenger Class')\n\
plt.xlabel('Passenger Class')\n\
plt.ylabel('Survival Rate (%)')\n\
for i, v in enumerate(survival_by_class):\n    ax.text(i, v + 1, f\"{v:.1f}%\", ha='center')\n\
plt.tight_layout()\n\
analysis_result = survival_by_class",
    },
    Example {
        dataset: "Titanic",
        query: "Create a histogram of passenger ages",
        code: "plt.figure(figsize=(12, 6))\n\
plt.hist(df['age'].dropna(), bins=30, color='skyblue', edgecolor='black', alpha=0.7)\n\
plt.axvline(df['age'].mean(), color='red', linestyle='dashed', linewidth=2, label='Mean age')\n\
plt.title('Distribution of Passenger Ages')\n\
plt.xlabel('Age (years)')\n\
plt.ylabel('Count')\n\
plt.legend()\n\
analysis_result = df['age'].describe()",
    },
    Example {
        dataset: "Iris",
        query: "Plot sepal length vs sepal width colored by species",
        code: "plt.figure(figsize=(10, 6))\n\
sns.scatterplot(data=df, x='sepal_length', y='sepal_width', hue='species', alpha=0.7)\n\
plt.title('Sepal Length vs Sepal Width by Species')\n\
plt.xlabel('Sepal Length (cm)')\n\
plt.ylabel('Sepal Width (cm)')\n\
analysis_result = df.groupby('species')[['sepal_length', 'sepal_width']].mean()",
    },
];

/// Prompt for `/analyze`: grounding context, the query, and the sectioned
/// response format the splitter expects.
pub fn analysis_prompt(query: &str, profile: &DatasetProfile, strategy: PromptStrategy) -> String {
    let mut prompt = format!(
        "The data is in a pandas DataFrame named 'df' with columns: {columns}.\n\
         pd, np, plt and sns are already imported; do not import them again.\n\n\
         Dataset profile:\n{profile}\n\n\
         User query: {query}\n\n\
         Respond using exactly these sections, each label on its own line:\n\
         Analysis: what the data suggests and how you will answer the query\n\
         Code: a single ```python fenced block operating on df; store numerical results in 'analysis_result'\n\
         Explanation: what the code does and how to read its output\n\
         Summary: one or two sentences with the key takeaway",
        columns = profile.columns.join(", "),
        profile = profile.render(),
        query = query.trim(),
    );

    match strategy {
        PromptStrategy::ZeroShot => {}
        PromptStrategy::FewShot => {
            prompt.push_str("\n\nHere are some examples of queries and their corresponding code:\n");
            for (index, example) in FEW_SHOT_EXAMPLES.iter().enumerate() {
                prompt.push_str(&format!(
                    "\nExample {} ({}):\nQuery: {}\nCode:\n```python\n{}\n```\n",
                    index + 1,
                    example.dataset,
                    example.query,
                    example.code
                ));
            }
            prompt.push_str(&format!("\nNow answer the query: {}", query.trim()));
        }
        PromptStrategy::Specialized(chart) => {
            prompt.push_str("\n\n");
            prompt.push_str(chart.guidance());
        }
    }

    prompt
}

/// Conversational prompt: profile, query, requirements and the
/// `Hypothesis:`/`Code:` reply format.
pub fn chat_prompt(query: &str, data_profile: &str) -> String {
    format!(
        r#"Task: Analyze dataset
Data Profile: {data_profile}
User Query: {query}

Requirements:
1. Generate Python code using df, plt, sns; these are already imported, DO NOT import them again
2. Store numerical results in 'analysis_result'
3. Create publication-quality visualization
4. Never use unsafe functions

Follow these examples:

Example 1 (Titanic):
Query: "Analyze survival rates by passenger class"
Hypothesis: First-class passengers had higher survival rates
Code: ```python
plt.figure(figsize=(10,6))
class_survival = df.groupby('Pclass')['Survived'].mean()
sns.barplot(x=class_survival.index, y=class_survival.values, palette="viridis")
plt.ylabel("Survival Rate")
plt.title("Survival Rates by Passenger Class")
analysis_result = class_survival
```

Example 2 (Boston Housing):
Query: "Show relationship between crime rate and home prices"
Hypothesis: Higher crime rates correlate with lower median home values
Code: ```python
plt.figure(figsize=(10,6))
sns.scatterplot(x='CRIM', y='MEDV', data=df, alpha=0.6)
plt.xlabel("Crime Rate per Capita")
plt.ylabel("Median Home Value ($1000s)")
plt.title("Crime Rate vs. Home Value")
analysis_result = df[['CRIM', 'MEDV']].corr().iloc[0,1]
```

Response Format:
Hypothesis: [Your initial prediction]
Code: ```python
# Your code
```
"#,
        data_profile = data_profile.trim(),
        query = query.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn profile() -> DatasetProfile {
        DatasetProfile::from_rows(vec!["age".into(), "fare".into()], 0, vec![], &[])
    }

    #[rstest]
    #[case("Show a histogram of ages", PromptStrategy::Specialized(ChartType::Histogram))]
    #[case("scatter fare against age", PromptStrategy::Specialized(ChartType::Scatter))]
    #[case("Bar chart of survivors per class", PromptStrategy::Specialized(ChartType::Bar))]
    #[case("boxplot of fares", PromptStrategy::Specialized(ChartType::Box))]
    #[case("What is the average fare?", PromptStrategy::FewShot)]
    #[case("embargo by port", PromptStrategy::FewShot)]
    fn strategy_follows_chart_keywords(#[case] query: &str, #[case] expected: PromptStrategy) {
        assert_eq!(PromptStrategy::for_query(query), expected);
    }

    #[test]
    fn analysis_prompt_names_columns_and_sections() {
        let prompt = analysis_prompt("average fare", &profile(), PromptStrategy::ZeroShot);
        assert!(prompt.contains("columns: age, fare"));
        assert!(prompt.contains("User query: average fare"));
        for label in ["Analysis:", "Code:", "Explanation:", "Summary:"] {
            assert!(prompt.contains(label), "missing {}", label);
        }
        assert!(!prompt.contains("Example 1"));
    }

    #[test]
    fn few_shot_appends_examples() {
        let prompt = analysis_prompt("average fare", &profile(), PromptStrategy::FewShot);
        assert!(prompt.contains("Example 1 (Titanic)"));
        assert!(prompt.contains("Example 3 (Iris)"));
        assert!(prompt.ends_with("Now answer the query: average fare"));
    }

    #[test]
    fn specialized_appends_chart_guidance() {
        let prompt = analysis_prompt("ages", &profile(), PromptStrategy::Specialized(ChartType::Histogram));
        assert!(prompt.ends_with(ChartType::Histogram.guidance()));
    }

    #[test]
    fn chat_prompt_embeds_profile_and_query() {
        let prompt = chat_prompt("  survival by sex ", "Columns: [Sex, Survived]");
        assert!(prompt.starts_with("Task: Analyze dataset\nData Profile: Columns: [Sex, Survived]\nUser Query: survival by sex\n"));
        assert!(prompt.contains("Response Format:\nHypothesis:"));
    }

    #[test]
    fn strategy_serde_names() {
        assert_eq!(serde_json::to_string(&PromptStrategy::FewShot).unwrap(), "\"few_shot\"");
        let parsed: PromptStrategy = serde_json::from_str(r#"{"specialized":"bar"}"#).unwrap();
        assert_eq!(parsed, PromptStrategy::Specialized(ChartType::Bar));
        assert_eq!("Box".parse::<ChartType>().unwrap(), ChartType::Box);
    }
}
