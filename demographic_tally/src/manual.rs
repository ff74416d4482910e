/*!

This is the long-form manual for `demographic_tally` and `donorprof`.

## Input formats

The following formats are supported:
* `xlsx` Excel workbook (the first worksheet unless a worksheet name is given)
* `csv` Comma Separated Values

In both cases the first row is the header. Every column is read as text: numbers are
written without a trailing `.0` when they are whole, dates are written as `YYYY-MM-DD` (with
the time when it is not midnight), and empty cells are missing values.

## Configuration

`donorprof` runs without any configuration file and then reproduces the default donor dashboard settings:

| key | default |
|-----|---------|
| `filePath` | `last.xlsx` |
| `eligibilityColumn` | `ÉLIGIBILITÉ_AU_DON.` |
| `eligibilityValue` | `Temporairement Non-eligible` |
| `cohortColumn` | `Genre_` |
| `cohortA` | `{"value": "Homme", "label": "Hommes", "color": "#1f77b4"}` |
| `cohortB` | `{"value": "Femme", "label": "Femmes", "color": "#ff7f0e"}` |
| `topN` | `4` |
| `missingPolicy` | `asCategory` |

`categoryColumns` lists the columns that can be selected, with a human-readable label and an
orientation (`v` or `h`) for the chart:

```json
{
  "categoryColumns": [
    {"column": "Classe_Age", "label": "Tranche d'âge", "orientation": "v"},
    {"column": "categories", "label": "Catégories professionnelles", "orientation": "h"}
  ]
}
```

## Aggregation

For the selected column, the values are counted separately in each cohort. The categories are
ranked by their combined count (both cohorts), and the first `topN` are kept. Categories with
the same combined count are ranked by the first row of the dataset in which they appear.

Both series of the result contain exactly the kept categories, in rank order. A category that
does not occur in a cohort is reported with a count of 0 for that cohort, so that grouped bars
line up.

With `missingPolicy` set to `asCategory`, empty cells are counted as the category `(missing)`.
With `drop`, they are ignored.

## Output

The chart is written as a JSON figure (two bar traces and a layout) that any Plotly front-end
can display. The same document carries a summary: the number of records in each cohort, and
each cohort's own most frequent values.

*/
