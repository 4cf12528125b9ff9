/*!

This is the long-form manual for `vote_atlas` and `voteatlas`.

## Input formats

Two inputs are loaded: a boundary file with the county shapes and, for each election year, a
CSV file with the county returns.

### Boundary files

Two flavours are accepted. The format is detected from the content, not from the file name:
a document containing `"type":"Topology"` (whitespace after the colon is allowed) is read as
TopoJSON, anything else as GeoJSON.

* **TopoJSON** (for example the `counties-10m.json` file of the `us-atlas` project). The
  topology must contain an object named `counties`, and may contain an object named `states`.
  Each geometry carries an `id`, which is the FIPS code of the county or of the state. Loading
  a topology replaces both the county and the state shapes.
* **GeoJSON**. A `FeatureCollection` in which every feature carries the county FIPS code in
  its `id`. There are no state shapes in this flavour, and only the county shapes are
  replaced.

Identifiers may be numbers (`6037`) or strings (`"06037"`). They are padded with zeros to
5 digits for counties and 2 digits for states. The state of a county is given by the first two
digits of its code.

Loading the same file twice is harmless: shapes are updated in place.

### Returns

A CSV file with a header row. The columns are found by name. The defaults follow the
county-level presidential results published for 2024:

| column          | content                          |
|-----------------|----------------------------------|
| `county_fips`   | county FIPS code                 |
| `county_name`   | county name                      |
| `votes_gop`     | votes of party A                 |
| `votes_dem`     | votes of party B                 |
| `total_votes`   | all votes cast, including others |
| `per_gop`       | share of party A (0..1)          |
| `per_dem`       | share of party B (0..1)          |

Rows whose identifier is shorter than 4 characters are ignored. Loading a year deletes all the
rows previously loaded for that year.

The margin of a county is `per_gop - per_dem`, computed from the shares of the file (not from
the vote counts, since the file may use a different denominator).

## Configuration

`voteatlas` takes an optional JSON configuration file with `--config` (or `-c`). Every key
may be left out, and a missing key keeps its default:

```json
{
  "storePath": "elections.db",
  "columns": {
    "countyId": "county_fips",
    "countyName": "county_name",
    "votesA": "votes_gop",
    "votesB": "votes_dem",
    "votesTotal": "total_votes",
    "pctA": "per_gop",
    "pctB": "per_dem"
  },
  "parties": { "a": "GOP", "b": "DEM" }
}
```

* `storePath`: the SQLite file of the store. The `--store` option of a command takes
  precedence over it, and `elections.db` is used when neither is given.
* `columns`: the header names of the returns CSV, one per field of the table above. Only the
  county name column may be absent from a file. Its names are then left empty.
* `parties`: the labels of party A and party B in the printed summaries. They do not change
  which columns are read.

The example above spells out the defaults.

## Outputs

* the list of counties of a year, each with its votes, shares, margin and shape;
* the list of states of a year, with the votes of their counties summed and the winner
  (party B wins ties);
* a GeoJSON `FeatureCollection` of the counties, written by `voteatlas export`. The
  `pct_a` property is written with exactly 6 decimals, and counties without a shape are left
  out;
* the same collection as a `var geojson = JSON.parse('...');` statement with a `color`
  property per county, written by `voteatlas script`.

## Colors

Margins are mapped to six colors:

| margin               | bucket   | color     |
|----------------------|----------|-----------|
| > 0.3334             | strong-A | `#B82D35` |
| > 0.1667             | lean-A   | `#E48268` |
| > 0                  | slight-A | `#FACCB4` |
| > -0.1667            | slight-B | `#BFDCEB` |
| > -0.3334            | lean-B   | `#6BACD0` |
| otherwise            | strong-B | `#2A71AE` |

A margin of exactly 0 is slight-B.

*/
