/*!

This is the long-form manual for `result_analysis` and `elres`.

## Analysis

The analysis follows the steps below for a checklist form:

1. The submissions are selected: master submissions (or observer submissions if
   the form does not track data conflicts) that are within the analysed location,
   not rejected by verification and not quarantined.
2. The submissions are turned into a table, with one column for each level of the
   administrative divisions and one column for each field that matters for the
   results. If the form has no registered voters field, the registered voters of
   the polling station are used.
3. The values marked as "not reported" (the `null_value` of a field, for example `999`)
   are replaced by missing values.
4. Each submission is marked as *reported* when all the result fields are filled,
   the registered voters are known and the vote shares add up to more than zero.
   A submission where every vote share is zero is considered not filled yet.
5. The reports are computed for the location and for every location of the
   political location types below it.
6. The convergence series are built from the reported submissions, in update order.

## Reports

| key                   | meaning |
|-----------------------|---------|
| `reported_cnt`        | number of reported submissions |
| `missing_cnt`         | number of submissions not reported |
| `rv`                  | registered voters of the reported submissions |
| `all_votes`           | vote shares + rejected + blank votes |
| `turnout`             | `all_votes / rv`, `Infinity` when `rv` is 0 |
| `all_valid_votes`     | sum of the vote shares |
| `total_rejected`      | rejected (invalid) votes |
| `total_blanks`        | blank votes |
| `<tag>_cnt`           | votes for one vote share field |
| `<tag>_pct`           | share of the valid votes for this field |
| `*_moe_95`, `*_moe_99`| margins of error, in percentage points |

Percentages over an empty total are 0. A location without any submission has a
report filled with zeros.

### Margins of error

The margins of error use a ratio estimator over the reported polling stations:

```text
p        = sum(a) / sum(m)
variance = (1 - f) / (k * mbar^2) * (sum(a^2) - 2 p sum(a m) + p^2 sum(m^2)) / (k - 1)
moe      = sqrt(|variance|) * z * 100
```

where `a` is the numerator and `m` the denominator at each station, `k` the number
of stations, `mbar` the mean of `m` and `f = sum(m) / N` the sampling fraction for a
population of size `N` (the `bigN` setting, no correction if not set). `z` is 1.96 for
95% and 2.58 for 99%. Margins that cannot be computed (a single station) are 0.

## Input formats

The following formats are supported for submissions:
* `json` an array of submissions
* `csv` Comma Separated Values, one submission per line
* `xlsx` Excel workbooks, one submission per row

### `json`

```text
[
  {"location": "PS1", "updated": "2022-10-01T10:00:00Z", "submissionType": "M",
   "values": {"RV": 100, "A": 60, "B": 40}}
]
```

`updated` is a number of seconds since the epoch or an RFC 3339 date. `submissionType`
(`M` or `O`, default `M`), `quarantineStatus` (`A`, `R` or empty) and `verificationStatus`
(`rejected` excludes the submission) are optional.

### `csv` and `xlsx`

The first row contains the names of the columns. The columns for the location, the
update time and the optional status columns are named in the file source, every other
column is read as a field tag. Empty cells are missing values.

```text
location,updated,type,RV,A,B
PS1,2022-10-01T10:00:00Z,M,100,60,40
```

## Configuration

`elres` reads a configuration file in JSON:

```text
{
  "outputSettings": {"analysisName": "General election"},
  "form": {"name": "Results", "fields": [{"tag": "A", "description": "Party A", "nullValue": 999}],
           "voteShares": ["A"], "registeredVotersTag": "RV"},
  "locationTypes": [{"name": "Country"}, {"name": "Ward", "parent": "Country", "isPolitical": true}],
  "locations": [{"code": "ZM", "name": "Zambia", "locationType": "Country"}],
  "submissionSources": [{"provider": "csv", "filePath": "submissions.csv"}],
  "analysis": {"location": null, "bigN": 7000000, "enableMoe": true}
}
```

File paths are relative to the configuration file. The `nullValue` of a field may be a
number or a string containing a number; other values are ignored.

 */
